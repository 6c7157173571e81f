use owo_colors::Style;

// Stylesheet used to colorize the results summary.
#[derive(Debug, Default)]
pub(crate) struct Styles {
    pub condition_style: Style,
    pub carrier_style: Style,
    pub value_style: Style,
    pub warning_style: Style,
}

impl Styles {
    /// Colour the summary when the terminal supports it
    pub(crate) fn for_stdout() -> Self {
        let mut styles = Self::default();
        if supports_color::on(supports_color::Stream::Stdout).is_some() {
            styles.colorize();
        }
        styles
    }

    pub(crate) fn colorize(&mut self) {
        self.condition_style = Style::new().bright_blue().bold();
        self.carrier_style = Style::new().bright_green();
        self.value_style = Style::new().bright_white();
        self.warning_style = Style::new().yellow();
    }
}
