use super::{Charges, MaterialParameters};
use crate::carrier::PerCarrier;
use nalgebra::RealField;

#[derive(Copy, Clone, Debug, serde::Deserialize, serde::Serialize)]
#[non_exhaustive]
/// Enum with all materials which have built-in parameter sets
///
/// As materials may be added in future this is labelled as `non_exhaustive`
pub enum Material {
    /// Gallium arsenide
    GaAs,
    /// Silicon
    Si,
    /// Lead telluride
    PbTe,
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Material::GaAs => {
                write!(f, "GaAs")
            }
            Material::Si => {
                write!(f, "Si")
            }
            Material::PbTe => {
                write!(f, "PbTe")
            }
        }
    }
}

impl Material {
    /// Builds an instance of `MaterialParameters` for the given `Material` variant
    pub fn get_info<T: RealField>(&self) -> MaterialParameters<T> {
        match self {
            Material::GaAs => MaterialParameters::gaas(),
            Material::Si => MaterialParameters::si(),
            Material::PbTe => MaterialParameters::pbte(),
        }
    }
}

impl<T: RealField> MaterialParameters<T> {
    #[numeric_literals::replace_float_literals(T::from_f64(literal).unwrap())]
    fn gaas() -> Self {
        Self {
            epsilon_s: 12.9,
            epsilon_inf: 10.9,
            w_pop: 8.73,
            c_el: 139.7,
            deformation_potential: PerCarrier::new(8.6, 8.6),
            p_pie: 0.052,
            n_dis: 0.1,
            scissor: 0.5818,
            charges: Charges::default(),
        }
    }

    #[numeric_literals::replace_float_literals(T::from_f64(literal).unwrap())]
    fn si() -> Self {
        Self {
            epsilon_s: 11.7,
            epsilon_inf: 11.6,
            w_pop: 15.23,
            c_el: 190.2,
            deformation_potential: PerCarrier::new(6.5, 6.5),
            p_pie: 0.01,
            n_dis: 0.1,
            scissor: 0.5154,
            charges: Charges::default(),
        }
    }

    #[numeric_literals::replace_float_literals(T::from_f64(literal).unwrap())]
    fn pbte() -> Self {
        Self {
            epsilon_s: 44.4,
            epsilon_inf: 25.6,
            w_pop: 10.0,
            c_el: 128.8,
            deformation_potential: PerCarrier::new(4.0, 4.0),
            p_pie: 0.15,
            n_dis: 0.1,
            scissor: 0.0,
            charges: Charges::default(),
        }
    }
}
