//! Environment source: `SITEGEN__SECTION__KEY`, e.g. `SITEGEN__IMAGES__ACCESS_KEY`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "SITEGEN";

pub fn source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Layer `env` over `builder`. `load` passes `source()`; tests pass one backed by a map.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    env: Environment,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Config;
    use std::collections::HashMap;

    #[test]
    fn double_underscore_keys_override_builder_values() {
        let map: HashMap<String, String> = [
            ("SITEGEN__IMAGES__ACCESS_KEY", "from-env"),
            ("SITEGEN__GENERATION__MAX_ATTEMPTS", "5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let builder = Config::builder()
            .set_default("images.access_key", "")
            .unwrap();

        let settings = add_to_builder(builder, source().source(Some(map)))
            .build()
            .unwrap();

        assert_eq!(settings.get_string("images.access_key").unwrap(), "from-env");
        assert_eq!(settings.get_int("generation.max_attempts").unwrap(), 5);
    }
}
