use base94::Alphabet;
use serde::Deserialize;

mod alphabet_parse;
pub mod setup;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub codec: CodecConfig,
    #[serde(default)]
    pub log: log4rs::config::RawConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct CodecConfig {
    /// Uses the standard alphabet if [`None`].
    #[serde(default, deserialize_with = "alphabet_parse::deserialize")]
    pub alphabet: Option<Alphabet>,
    /// Symbols per line of encoded output; 0 disables wrapping.
    #[serde(default)]
    pub wrap: usize,
}

#[cfg(test)]
mod tests {
    use super::setup::{Builder, TomlText};
    use super::*;

    #[test]
    fn defaults_deserialize() {
        let config: Config = Builder::new()
            .add_layer(TomlText::new(include_str!("../../assets/default_config.toml")))
            .build()
            .expect("default config must be valid");

        assert!(config.codec.alphabet.is_none(), "no alphabet by default");
        assert_eq!(config.codec.wrap, 0);
    }

    #[test]
    fn custom_alphabet_deserializes() {
        let reversed: String = Alphabet::STANDARD.symbols().chars().rev().collect();
        let toml = format!("[codec]\nalphabet = '''{reversed}'''\nwrap = 76\n");

        let config: Config = Builder::new()
            .add_layer(TomlText::new(&toml))
            .build()
            .expect("config must be valid");

        let alphabet = config.codec.alphabet.expect("alphabet was set");
        assert_eq!(alphabet.symbols(), reversed);
        assert_eq!(config.codec.wrap, 76);
    }

    #[test]
    fn invalid_alphabet_fails() {
        let result = Builder::new()
            .add_layer(TomlText::new("[codec]\nalphabet = \"abc\"\n"))
            .build::<Config>();

        let err = result.expect_err("alphabet of 3 symbols must be rejected");
        assert!(format!("{err:#}").contains("94 symbols"), "unexpected error: {err:#}");
    }
}
