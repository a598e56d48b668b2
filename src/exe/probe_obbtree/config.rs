use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::Path;
use serde::Deserialize;
use containers_obbtree::{BuildOptions, ObbTreeError};

#[derive(Debug)]
pub enum ProbeError
{
    Io(std::io::Error),
    Toml(toml::de::Error),
    InvalidConfig(&'static str),
    Tree(ObbTreeError),
    MissedElement { query: usize, element: u32 },
    UnexpectedHit { query: usize, element: u32 },
    DuplicateHit { query: usize, element: u32 },
}
impl Display for ProbeError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for ProbeError
{
    fn source(&self) -> Option<&(dyn Error + 'static)>
    {
        match self
        {
            Self::Io(err) => Some(err),
            Self::Toml(err) => Some(err),
            Self::Tree(err) => Some(err),
            _ => None,
        }
    }
}
impl From<std::io::Error> for ProbeError
{
    fn from(err: std::io::Error) -> Self { Self::Io(err) }
}
impl From<toml::de::Error> for ProbeError
{
    fn from(err: toml::de::Error) -> Self { Self::Toml(err) }
}
impl From<ObbTreeError> for ProbeError
{
    fn from(err: ObbTreeError) -> Self { Self::Tree(err) }
}

/// Random scene and query parameters. Missing keys take their default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProbeConfig
{
    pub element_count: usize,
    pub points_per_element: usize,
    pub scatter_extent: f32, // elements are centered in [-extent, extent]^3
    pub element_size: f32,
    pub inflation_radius: f32,
    pub query_count: usize,
    pub query_size: f32,
    pub seed: u64,
    pub build: BuildOptions,
}
impl Default for ProbeConfig
{
    fn default() -> Self
    {
        Self
        {
            element_count: 10_000,
            points_per_element: 8,
            scatter_extent: 100.0,
            element_size: 1.0,
            inflation_radius: 0.05,
            query_count: 1_000,
            query_size: 5.0,
            seed: 0x0bb7_7ee5,
            build: BuildOptions::default(),
        }
    }
}
impl ProbeConfig
{
    pub fn parse(toml_str: &str) -> Result<Self, ProbeError>
    {
        let config: Self = toml::from_str(toml_str)?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ProbeError>
    {
        let toml_str = std::fs::read_to_string(path)?;
        Self::parse(&toml_str)
    }

    pub fn check(&self) -> Result<(), ProbeError>
    {
        if self.points_per_element == 0
        {
            return Err(ProbeError::InvalidConfig("points_per_element must be at least 1"));
        }
        if !(self.scatter_extent >= 0.0)
        {
            return Err(ProbeError::InvalidConfig("scatter_extent must be non-negative"));
        }
        if !(self.element_size > 0.0) || !(self.query_size > 0.0)
        {
            return Err(ProbeError::InvalidConfig("element_size and query_size must be positive"));
        }
        if !(self.inflation_radius >= 0.0)
        {
            return Err(ProbeError::InvalidConfig("inflation_radius must be non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn partial_file()
    {
        let config = ProbeConfig::parse(r#"
            element_count = 25
            seed = 9

            [build]
            validate = true
        "#).unwrap();

        assert_eq!(config.element_count, 25);
        assert_eq!(config.seed, 9);
        assert!(config.build.validate);
        assert_eq!(config.query_count, ProbeConfig::default().query_count);
    }

    #[test]
    fn empty_file()
    {
        assert_eq!(ProbeConfig::parse("").unwrap(), ProbeConfig::default());
    }

    #[test]
    fn rejects_bad_values()
    {
        assert!(matches!(ProbeConfig::parse("points_per_element = 0"), Err(ProbeError::InvalidConfig(_))));
        assert!(matches!(ProbeConfig::parse("query_size = -1.0"), Err(ProbeError::InvalidConfig(_))));
        assert!(matches!(ProbeConfig::parse("element_count = \"lots\""), Err(ProbeError::Toml(_))));
    }
}
