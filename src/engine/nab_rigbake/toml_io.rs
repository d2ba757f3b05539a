use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

pub trait TomlRead: DeserializeOwned
{
    fn load(reader: &mut impl Read) -> Result<Self, Box<dyn std::error::Error>>
    {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Ok(toml::from_str(&buf)?)
    }
}
pub trait TomlWrite: Serialize
{
    fn save(&self, prettify: bool, writer: &mut impl Write) -> Result<(), Box<dyn std::error::Error>>
    {
        let toml = if prettify
        {
            toml::ser::to_string_pretty(self)?
        }
        else
        {
            toml::ser::to_string(self)?
        };
        writer.write_all(toml.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use serde::Deserialize;
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Settings
    {
        name: String,
        count: u32,
    }
    impl TomlRead for Settings { }
    impl TomlWrite for Settings { }

    #[test]
    fn save_then_load()
    {
        let settings = Settings { name: "walk".to_string(), count: 3 };
        let mut buf = Vec::new();
        settings.save(true, &mut buf).unwrap();

        let loaded = Settings::load(&mut buf.as_slice()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_keys_default()
    {
        let loaded = Settings::load(&mut "count = 7".as_bytes()).unwrap();
        assert_eq!(loaded, Settings { name: String::new(), count: 7 });
    }
}
