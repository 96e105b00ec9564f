//! Archive extraction tool selection.
//!
//! Extraction is delegated to external tools, chosen by a lookup from the
//! archive's file extension. Adding a format means adding a table entry;
//! planner control flow never changes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::EngineError;
use crate::plan::Step;

/// External extraction tool variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// `.zip` via unzip.
    Zip,
    /// `.tar` via tar.
    Tar,
    /// `.tar.gz` / `.tgz` via tar -z.
    TarGz,
    /// `.7z` via 7z.
    SevenZip,
    /// `.rar` via unrar.
    Rar,
}

static EXTENSION_MAP: LazyLock<HashMap<&'static str, ArchiveFormat>> = LazyLock::new(|| {
    HashMap::from([
        ("zip", ArchiveFormat::Zip),
        ("tar", ArchiveFormat::Tar),
        ("tgz", ArchiveFormat::TarGz),
        ("tar.gz", ArchiveFormat::TarGz),
        ("7z", ArchiveFormat::SevenZip),
        ("rar", ArchiveFormat::Rar),
    ])
});

impl ArchiveFormat {
    /// Determine the format from a filesystem path. Compound `.tar.gz`
    /// extensions are matched before the single-segment fallback.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") {
            return Some(Self::TarGz);
        }
        let ext = name.rsplit('.').next()?;
        EXTENSION_MAP.get(ext).copied()
    }

    /// The external program that handles this format.
    pub fn program(&self) -> &'static str {
        match self {
            Self::Zip => "unzip",
            Self::Tar | Self::TarGz => "tar",
            Self::SevenZip => "7z",
            Self::Rar => "unrar",
        }
    }

    /// Argument list extracting `archive` into `dest`.
    pub fn args(&self, archive: &Path, dest: &Path) -> Vec<String> {
        let archive = archive.to_string_lossy().to_string();
        let dest_str = dest.to_string_lossy().to_string();
        match self {
            Self::Zip => vec!["-o".into(), archive, "-d".into(), dest_str],
            Self::Tar => vec!["-xf".into(), archive, "-C".into(), dest_str],
            Self::TarGz => vec!["-xzf".into(), archive, "-C".into(), dest_str],
            Self::SevenZip => vec!["x".into(), "-y".into(), format!("-o{dest_str}"), archive],
            Self::Rar => vec!["x".into(), "-o+".into(), archive, dest_str],
        }
    }
}

/// Build the single extraction step for an archive, or fail for an
/// unrecognized extension.
pub fn extraction_step(archive: &Path, dest: &Path) -> Result<Step, EngineError> {
    let format = ArchiveFormat::from_path(archive).ok_or_else(|| {
        EngineError::UnsupportedArchive {
            extension: archive
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string(),
        }
    })?;

    Ok(Step {
        program: format.program().to_string(),
        args: format.args(archive, dest),
        output: dest.to_path_buf(),
        label: "extract",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_lookup() {
        assert_eq!(
            ArchiveFormat::from_path(Path::new("a.zip")),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("a.tar.gz")),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("a.TGZ")),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(ArchiveFormat::from_path(Path::new("a.mp4")), None);
    }

    #[test]
    fn test_extraction_step_for_zip() {
        let step = extraction_step(Path::new("/w/in.zip"), Path::new("/w/out")).expect("step");
        assert_eq!(step.program, "unzip");
        assert_eq!(step.args, vec!["-o", "/w/in.zip", "-d", "/w/out"]);
        assert_eq!(step.output, PathBuf::from("/w/out"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = extraction_step(Path::new("/w/in.xyz"), Path::new("/w/out")).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnsupportedArchive { extension } if extension == "xyz"
        ));
    }
}
