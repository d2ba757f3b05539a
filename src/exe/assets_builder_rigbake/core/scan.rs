use scene_rigbake::is_supported_extension;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ScanError
{
    IOError(io::Error),
    NotADirectory(PathBuf),
}
impl Error for ScanError { }
impl Display for ScanError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl From<walkdir::Error> for ScanError
{
    fn from(err: walkdir::Error) -> Self { ScanError::IOError(err.into()) }
}

fn is_source_file(path: &Path) -> bool
{
    path.extension().is_some_and(|ext| match ext.to_str()
    {
        None => false,
        Some(e) => is_supported_extension(e),
    })
}

/// Importable files directly inside a directory (not recursive)
pub struct ScanSources
{
    walk_dir: walkdir::IntoIter,
}
impl ScanSources
{
    pub fn new(input_dir: impl AsRef<Path>) -> Result<Self, ScanError>
    {
        let input_dir = input_dir.as_ref();
        if !input_dir.is_dir()
        {
            return Err(ScanError::NotADirectory(input_dir.to_path_buf()));
        }

        Ok(Self
        {
            walk_dir: walkdir::WalkDir::new(input_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter(),
        })
    }
}
impl Iterator for ScanSources
{
    type Item = Result<PathBuf, ScanError>;

    fn next(&mut self) -> Option<Self::Item>
    {
        for maybe_entry in self.walk_dir.by_ref()
        {
            let entry = match maybe_entry
            {
                Ok(e) => e,
                Err(err) => return Some(Err(err.into())),
            };

            if entry.file_type().is_file() && is_source_file(entry.path())
            {
                return Some(Ok(entry.into_path()));
            }
        }
        None
    }
}
