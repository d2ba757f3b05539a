use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const OUTPUT_EXTENSION: &str = "bin";

/// `<output_dir>/<source stem>.bin`
#[must_use]
pub fn output_path(output_dir: &Path, source: &Path) -> PathBuf
{
    let mut file_name = source.file_stem().unwrap_or(source.as_os_str()).to_owned();
    file_name.push(".");
    file_name.push(OUTPUT_EXTENSION);
    output_dir.join(file_name)
}

/// Write to a sibling temp file, then rename over `path`. The temp file never outlives a failure
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()>
{
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let result = (||
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, path)
    })();

    if result.is_err()
    {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn names()
    {
        assert_eq!(output_path(Path::new("export"), Path::new("import/Hero.Run.glb")), Path::new("export/Hero.Run.bin"));
        assert_eq!(output_path(Path::new("out"), Path::new("rig.gltf")), Path::new("out/rig.bin"));
    }

    #[test]
    fn replaces_and_cleans_up()
    {
        let dir = std::env::temp_dir().join(format!("rigbake_output_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join("a.bin");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!dir.join("a.bin.tmp").exists());

        let missing = dir.join("missing").join("b.bin");
        assert!(write_atomic(&missing, b"x").is_err());
        assert!(!dir.join("missing").join("b.bin.tmp").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
