use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use stagehand_archive::{
    Compression, UnpackOptions, UnpackReport, Unpacker, detect_file, unpack_file,
    unpack_file_detect,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CompressionArg {
    /// Decide from the magic bytes, then the file extension
    #[default]
    Auto,
    Gzip,
    None,
}

#[derive(Clone, Debug, Args)]
pub struct UnpackArg {
    /// Archive to unpack
    pub archive: PathBuf,

    /// Directory to unpack into; created if missing
    pub destination: PathBuf,

    #[arg(long, value_enum, default_value_t, env = "STAGEHAND_COMPRESSION")]
    pub compression: CompressionArg,

    /// Drop this many leading path components from every entry
    #[arg(long, default_value_t = 0, env = "STAGEHAND_STRIP_COMPONENTS")]
    pub strip_components: usize,

    /// Unpack next to the destination first and move it into place on success
    #[arg(long)]
    pub staged: bool,
}

pub fn execute(arg: UnpackArg) -> anyhow::Result<()> {
    let report = run(&arg)?;

    tracing::info!(
        archive = %arg.archive.display(),
        destination = %arg.destination.display(),
        directories = report.directories,
        files = report.files,
        skipped = report.skipped,
        bytes = report.total_bytes,
        "unpacked"
    );

    Ok(())
}

fn run(arg: &UnpackArg) -> anyhow::Result<UnpackReport> {
    let options = UnpackOptions::default().strip_components(arg.strip_components);

    let compression = match (arg.compression, arg.staged) {
        (CompressionArg::Auto, false) => {
            return unpack_file_detect(&arg.archive, &arg.destination, &options)
                .with_context(|| format!("failed to unpack '{}'", arg.archive.display()));
        }
        (CompressionArg::Auto, true) => detect_file(&arg.archive).with_context(|| {
            format!(
                "cannot tell how '{}' is compressed; pass --compression",
                arg.archive.display()
            )
        })?,
        (CompressionArg::Gzip, _) => Compression::Gzip,
        (CompressionArg::None, _) => Compression::None,
    };
    let options = options.compression(compression);

    if !arg.staged {
        return unpack_file(&arg.archive, &arg.destination, &options)
            .with_context(|| format!("failed to unpack '{}'", arg.archive.display()));
    }

    let file = File::open(&arg.archive)
        .with_context(|| format!("failed to open '{}'", arg.archive.display()))?;
    let staged = Unpacker::new(options)
        .archive_label(&arg.archive)
        .unpack_staged(file, &arg.destination)
        .with_context(|| format!("failed to unpack '{}'", arg.archive.display()))?;

    tracing::debug!(staging = %staged.staging_path().display(), "unpacked into staging");

    staged.commit().with_context(|| {
        format!(
            "failed to move unpacked tree onto '{}'",
            arg.destination.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use super::*;

    fn distribution_tgz(path: &Path) {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, mode, data) in [
            ("kafka/bin/run.sh", 0o755, &b"#!/bin/sh\necho hi\n"[..]),
            ("kafka/config/app.conf", 0o644, &b"k=v\n"[..]),
        ] {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(mode);
            builder.append_data(&mut header, name, data).unwrap();
        }
        let tar = builder.into_inner().unwrap();

        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&tar).unwrap();
        std::fs::write(path, encoder.finish().unwrap()).unwrap();
    }

    fn arg(archive: PathBuf, destination: PathBuf) -> UnpackArg {
        UnpackArg {
            archive,
            destination,
            compression: CompressionArg::Auto,
            strip_components: 1,
            staged: false,
        }
    }

    #[test]
    fn auto_detects_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("kafka.bin");
        distribution_tgz(&archive);

        let report = run(&arg(archive, dir.path().join("out"))).unwrap();

        assert_eq!(report.compression, Compression::Gzip);
        assert_eq!(report.files, 2);
        assert!(dir.path().join("out/bin/run.sh").exists());
    }

    #[test]
    fn staged_with_detection() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("kafka.tgz");
        distribution_tgz(&archive);
        let mut arg = arg(archive, dir.path().join("out"));
        arg.staged = true;

        let report = run(&arg).unwrap();

        assert_eq!(report.compression, Compression::Gzip);
        assert_eq!(
            report.find("kafka/config/app.conf").unwrap().target(),
            Some(dir.path().join("out/config/app.conf").as_path())
        );
    }

    #[test]
    fn explicit_none_on_gzip_fails() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("kafka.tgz");
        distribution_tgz(&archive);
        let mut arg = arg(archive, dir.path().join("out"));
        arg.compression = CompressionArg::None;

        let err = run(&arg).unwrap_err();

        assert!(err.to_string().contains("failed to unpack"));
    }

    #[test]
    fn undetectable_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("notes.txt");
        std::fs::write(&archive, "plain text").unwrap();
        let mut arg = arg(archive, dir.path().join("out"));
        arg.staged = true;

        let err = run(&arg).unwrap_err();

        assert!(err.to_string().contains("--compression"));
        assert!(matches!(
            err.downcast_ref::<stagehand_archive::Error>(),
            Some(stagehand_archive::Error::UnsupportedFormat { .. })
        ));
    }
}
