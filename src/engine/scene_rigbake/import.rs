use crate::Scene;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::Path;
use unicase::UniCase;

#[derive(Debug)]
pub enum ImportError
{
    IOError(std::io::Error),
    Gltf(gltf::Error),
    UnsupportedExtension(String),
    NoScene,
    MissingAttribute
    {
        mesh: String,
        attribute: &'static str,
    },
}
impl Error for ImportError { }
impl Display for ImportError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl From<std::io::Error> for ImportError
{
    fn from(err: std::io::Error) -> Self { ImportError::IOError(err) }
}
impl From<gltf::Error> for ImportError
{
    fn from(err: gltf::Error) -> Self { ImportError::Gltf(err) }
}

/// Source file extensions `import_scene` understands
pub const SUPPORTED_EXTENSIONS: &[&str] = &["gltf", "glb"];

#[must_use]
pub fn is_supported_extension(ext: &str) -> bool
{
    SUPPORTED_EXTENSIONS.iter().any(|s| UniCase::new(*s) == UniCase::new(ext))
}

/// Parse a source file into a scene, picking the importer by extension
pub fn import_scene(path: impl AsRef<Path>) -> Result<Scene, ImportError>
{
    let path = path.as_ref();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if !is_supported_extension(ext)
    {
        return Err(ImportError::UnsupportedExtension(ext.to_string()));
    }

    crate::gltf_import::import_gltf_file(path)
}
