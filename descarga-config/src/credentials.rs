use std::env;

use descarga_model::Credentials;

use crate::constants::{ENV_CONTRACT_PASSWORD, ENV_CONTRACT_RFC};
use crate::error::ConfigLoadError;

/// Read the download-service contract credentials from `$DESCARGA_RFC` and
/// `$DESCARGA_PASSWORD`.
pub fn load_contract_credentials() -> Result<Credentials, ConfigLoadError> {
    contract_credentials_with(|key| env::var(key).ok())
}

pub fn contract_credentials_with<F>(lookup: F) -> Result<Credentials, ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |var: &'static str| {
        lookup(var)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigLoadError::MissingCredential { var })
    };

    let user = read(ENV_CONTRACT_RFC)?;
    let password = read(ENV_CONTRACT_PASSWORD)?;
    Ok(Credentials::new(user.trim(), password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_variables_are_required() {
        let only_rfc = contract_credentials_with(|key| {
            (key == ENV_CONTRACT_RFC).then(|| "AAA010101AAA".to_string())
        });
        assert!(matches!(
            only_rfc,
            Err(ConfigLoadError::MissingCredential {
                var: ENV_CONTRACT_PASSWORD
            })
        ));
    }

    #[test]
    fn trims_the_rfc() {
        let creds = contract_credentials_with(|key| match key {
            ENV_CONTRACT_RFC => Some(" AAA010101AAA ".to_string()),
            ENV_CONTRACT_PASSWORD => Some("secret".to_string()),
            _ => None,
        })
        .expect("credentials");
        assert_eq!(creds.user(), "AAA010101AAA");
        assert_eq!(creds.password(), "secret");
    }
}
