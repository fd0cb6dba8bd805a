//! Archive extraction dispatch.
//!
//! The strategy is keyed by (platform family, file suffix) through an
//! ordered lookup table. Self-installing executables and disk images are
//! deliberately `NoOp`: the installer orchestration runs or mounts them
//! itself. Anything outside the table is an unsupported combination.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

use crate::core::platform::Platform;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unsupported file type for platform {platform}: {file}")]
    Unsupported { platform: String, file: String },

    #[error("archive error: {0}")]
    Archive(String),
}

/// Extraction strategy for one (platform family, suffix) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing to unpack: self-installing executable, or a disk image the
    /// caller mounts separately.
    NoOp,
    Zip,
    SevenZip,
    TarGz,
    /// tar with the xz filter instead of the default gzip one.
    TarXz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Windows,
    Mac,
    Linux,
}

/// Dispatch table, first match wins. ARM variants share their family row.
const DISPATCH: &[(Family, &str, Action)] = &[
    (Family::Windows, ".exe", Action::NoOp),
    (Family::Windows, ".zip", Action::Zip),
    (Family::Windows, ".7z", Action::SevenZip),
    (Family::Mac, ".dmg", Action::NoOp),
    (Family::Mac, ".zip", Action::Zip),
    (Family::Linux, ".tar.gz", Action::TarGz),
    (Family::Linux, ".tar.xz", Action::TarXz),
];

fn family_of(platform: &Platform) -> Option<Family> {
    match platform {
        Platform::Windows | Platform::WindowsArm => Some(Family::Windows),
        Platform::Mac => Some(Family::Mac),
        Platform::Linux | Platform::LinuxArm => Some(Family::Linux),
        Platform::Other(_) => None,
    }
}

/// Look up the extraction strategy for `file` on `platform`.
pub fn classify(platform: &Platform, file: &Path) -> Result<Action, ExtractError> {
    let unsupported = || ExtractError::Unsupported {
        platform: platform.id().to_string(),
        file: file.display().to_string(),
    };

    let family = family_of(platform).ok_or_else(unsupported)?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .ok_or_else(unsupported)?;

    DISPATCH
        .iter()
        .find(|(f, suffix, _)| *f == family && name.ends_with(suffix))
        .map(|(_, _, action)| *action)
        .ok_or_else(unsupported)
}

/// Extract `file` into `destination` and return the resulting path.
///
/// `NoOp` entries return `destination` untouched.
pub fn extract(platform: &Platform, file: &Path, destination: &Path) -> Result<PathBuf, ExtractError> {
    let action = classify(platform, file)?;
    debug!(?action, file = %file.display(), dest = %destination.display(), "extracting");
    match action {
        Action::NoOp => Ok(destination.to_path_buf()),
        Action::Zip => extract_zip(file, destination),
        Action::SevenZip => extract_7z(file, destination),
        Action::TarGz => {
            let reader = BufReader::new(File::open(file)?);
            extract_tar(flate2::read::GzDecoder::new(reader), destination)
        }
        Action::TarXz => {
            let reader = BufReader::new(File::open(file)?);
            extract_tar(xz2::read::XzDecoder::new(reader), destination)
        }
    }
}

/// Extract a zip archive, restoring unix permission bits.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<PathBuf, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        // enclosed_name rejects entries that would escape the destination.
        let Some(relative_path) = entry.enclosed_name() else {
            continue;
        };

        let absolute_path = dest_dir.join(&relative_path);
        if entry.is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(dest_dir.to_path_buf())
}

fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<PathBuf, ExtractError> {
    fs::create_dir_all(dest_dir)?;
    let mut archive = tar::Archive::new(reader);
    archive.unpack(dest_dir)?;
    Ok(dest_dir.to_path_buf())
}

/// Extract a 7-Zip archive through the external `7z` tool.
fn extract_7z(archive_path: &Path, dest_dir: &Path) -> Result<PathBuf, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let tool = which::which("7z")
        .or_else(|_| which::which("7za"))
        .map_err(|_| ExtractError::Archive("7z executable not found on PATH".to_string()))?;

    let status = Command::new(tool)
        .arg("x")
        .arg(archive_path)
        .arg(format!("-o{}", dest_dir.display()))
        .arg("-y")
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        return Err(ExtractError::Archive(format!(
            "7z extraction of {} failed with {status}",
            archive_path.display()
        )));
    }

    Ok(dest_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_exe_is_a_noop() {
        let action = classify(&Platform::Windows, Path::new("VulkanSDK-Installer.exe")).unwrap();
        assert_eq!(action, Action::NoOp);
        let action = classify(&Platform::WindowsArm, Path::new("VulkanSDK-Installer.exe")).unwrap();
        assert_eq!(action, Action::NoOp);
    }

    #[test]
    fn exe_on_windows_returns_destination_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let installer = dir.path().join("installer.exe");
        fs::write(&installer, b"MZ").unwrap();

        let dest = dir.path().join("out");
        let result = extract(&Platform::Windows, &installer, &dest).unwrap();
        assert_eq!(result, dest);
        // Nothing was created; the installer handles its own layout.
        assert!(!dest.exists());
    }

    #[test]
    fn dispatch_table_covers_documented_pairs() {
        assert_eq!(classify(&Platform::Windows, Path::new("a.zip")).unwrap(), Action::Zip);
        assert_eq!(classify(&Platform::Windows, Path::new("a.7z")).unwrap(), Action::SevenZip);
        assert_eq!(classify(&Platform::Mac, Path::new("a.dmg")).unwrap(), Action::NoOp);
        assert_eq!(classify(&Platform::Mac, Path::new("a.zip")).unwrap(), Action::Zip);
        assert_eq!(classify(&Platform::Linux, Path::new("a.tar.gz")).unwrap(), Action::TarGz);
        assert_eq!(classify(&Platform::Linux, Path::new("a.tar.xz")).unwrap(), Action::TarXz);
        assert_eq!(classify(&Platform::LinuxArm, Path::new("a.tar.xz")).unwrap(), Action::TarXz);
    }

    #[test]
    fn tar_xz_uses_the_xz_filter_not_gzip() {
        // Classification alone decides the decoder; the xz pairing must
        // never fall through to the gzip row.
        assert_eq!(
            classify(&Platform::Linux, Path::new("vulkansdk-linux-x86_64.tar.xz")).unwrap(),
            Action::TarXz
        );
        assert_eq!(
            classify(&Platform::Linux, Path::new("vulkansdk-linux-x86_64.tar.gz")).unwrap(),
            Action::TarGz
        );
    }

    #[test]
    fn unknown_extension_names_the_file() {
        let err = classify(&Platform::Linux, Path::new("mystery.rar")).unwrap_err();
        assert!(err.to_string().contains("mystery.rar"), "{err}");

        let err = classify(&Platform::Mac, Path::new("a.tar.gz")).unwrap_err();
        assert!(err.to_string().contains("a.tar.gz"), "{err}");
    }

    #[test]
    fn unknown_platform_names_the_platform() {
        let platform = Platform::Other("freebsd".to_string());
        let err = classify(&platform, Path::new("a.zip")).unwrap_err();
        assert!(err.to_string().contains("freebsd"), "{err}");
    }

    #[test]
    fn zip_roundtrip() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("bundle.zip");

        let file = File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("sub", options).unwrap();
        writer.start_file("sub/hello.txt", options).unwrap();
        writer.write_all(b"hello").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        let result = extract(&Platform::Windows, &archive_path, &dest).unwrap();
        assert_eq!(result, dest);
        assert_eq!(fs::read(dest.join("sub/hello.txt")).unwrap(), b"hello");
    }

    #[test]
    fn tar_gz_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("bundle.tar.gz");

        let file = File::create(&archive_path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(5);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "1.3.250.1/readme.txt", &b"tarry"[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = dir.path().join("out");
        extract(&Platform::Linux, &archive_path, &dest).unwrap();
        assert_eq!(fs::read(dest.join("1.3.250.1/readme.txt")).unwrap(), b"tarry");
    }

    #[test]
    fn tar_xz_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("bundle.tar.xz");

        let file = File::create(&archive_path).unwrap();
        let encoder = xz2::write::XzEncoder::new(file, 6);
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(2);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "bin/tool", &b"xz"[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = dir.path().join("out");
        extract(&Platform::LinuxArm, &archive_path, &dest).unwrap();
        assert_eq!(fs::read(dest.join("bin/tool")).unwrap(), b"xz");
    }
}
