use std::{fmt, str::FromStr};

use crate::MlErr;

/// The role a parameter array plays inside its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Weight,
    Bias,
    Gamma,
    Beta,
}

impl Role {
    fn prefix(self) -> &'static str {
        match self {
            Role::Weight => "W",
            Role::Bias => "b",
            Role::Gamma => "gamma",
            Role::Beta => "beta",
        }
    }
}

/// Addresses one parameter array of a model, `layer` is one based.
///
/// Keys print and parse with the conventional names: `W1`, `b1`, `gamma1`, `beta1`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamKey {
    pub layer: usize,
    pub role: Role,
}

impl ParamKey {
    pub fn new(layer: usize, role: Role) -> Self {
        Self { layer, role }
    }

    pub fn weight(layer: usize) -> Self {
        Self::new(layer, Role::Weight)
    }

    pub fn bias(layer: usize) -> Self {
        Self::new(layer, Role::Bias)
    }

    pub fn gamma(layer: usize) -> Self {
        Self::new(layer, Role::Gamma)
    }

    pub fn beta(layer: usize) -> Self {
        Self::new(layer, Role::Beta)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.role.prefix(), self.layer)
    }
}

impl FromStr for ParamKey {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MlErr::InvalidParamKey(s.to_string());

        // longest prefixes first, `b` would otherwise shadow `beta`
        let role = [Role::Gamma, Role::Beta, Role::Weight, Role::Bias]
            .into_iter()
            .find(|role| {
                s.strip_prefix(role.prefix())
                    .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|c| c.is_ascii_digit()))
            })
            .ok_or_else(invalid)?;

        let layer: usize = s[role.prefix().len()..].parse().map_err(|_| invalid())?;
        if layer == 0 {
            return Err(invalid());
        }

        Ok(Self { layer, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_print_conventional_names() {
        assert_eq!(ParamKey::weight(1).to_string(), "W1");
        assert_eq!(ParamKey::bias(12).to_string(), "b12");
        assert_eq!(ParamKey::gamma(2).to_string(), "gamma2");
        assert_eq!(ParamKey::beta(3).to_string(), "beta3");
    }

    #[test]
    fn test_keys_parse_back() {
        for name in ["W1", "b2", "gamma3", "beta10"] {
            let key: ParamKey = name.parse().unwrap();
            assert_eq!(key.to_string(), name);
        }
        assert_eq!("beta4".parse::<ParamKey>().unwrap(), ParamKey::beta(4));
    }

    #[test]
    fn test_malformed_keys_are_rejected() {
        for name in ["", "W", "W0", "w1", "bx", "gamma", "delta1", "b-1", "W1a"] {
            assert!(name.parse::<ParamKey>().is_err(), "{name} parsed");
        }
    }
}
