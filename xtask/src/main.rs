use anyhow::{bail, ensure, Context as _};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::{env, fs};

fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);

    match (args.next().as_deref(), args.next()) {
        (Some("gen"), None) => gen_workload_protos(),
        (Some("-h") | Some("--help") | None, _) => {
            eprintln!("{}", usage_text());
            Ok(())
        }
        (Some(cmd), _) => bail!("unknown command: {cmd}\n\n{}", usage_text()),
    }
}

fn usage_text() -> &'static str {
    "Usage:
  cargo run -p xtask -- gen"
}

fn repo_root() -> anyhow::Result<PathBuf> {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .context("xtask must be in a workspace with a parent directory")
        .map(Path::to_path_buf)
}

fn gen_workload_protos() -> anyhow::Result<()> {
    let repo_root = repo_root()?;

    let proto_dir = repo_root.join("src/proto");
    let proto_file = proto_dir.join("workload.proto");
    ensure!(
        proto_file.exists(),
        "proto file not found: {}",
        proto_file.display()
    );

    // Committed output directory
    let out_dir = repo_root.join("src/workload_api/pb");
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output dir: {}", out_dir.display()))?;

    // A clean temp dir keeps stale files out of the selection below.
    let tmp_dir = out_dir.join(".tmp");
    reset_dir(&tmp_dir)?;

    let fds = protox::compile([proto_file.as_path()], [proto_dir.as_path()])
        .context("failed to compile workload proto")?;

    tonic_prost_build::configure()
        .build_client(true)
        .build_server(false)
        .out_dir(&tmp_dir)
        .compile_fds_with_config(fds, prost_build::Config::new())
        .context("failed to generate workload bindings")?;

    // The proto has no package, so prost emits a single `_.rs`.
    let generated = single_generated_rs(&tmp_dir)?;
    let final_path = out_dir.join("workload.rs");
    replace_file(&generated, &final_path)?;
    fs::remove_dir_all(&tmp_dir)
        .with_context(|| format!("failed to remove temp dir {}", tmp_dir.display()))?;

    // Formatting is best effort.
    let _ = Command::new("rustfmt")
        .arg("--edition")
        .arg("2021")
        .arg(&final_path)
        .status();

    println!("Generated {}", final_path.display());
    Ok(())
}

fn reset_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("failed to remove {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    Ok(())
}

fn single_generated_rs(dir: &Path) -> anyhow::Result<PathBuf> {
    let mut rs_files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read dir {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension() == Some(OsStr::new("rs")))
        .collect();

    ensure!(
        rs_files.len() == 1,
        "expected exactly 1 generated .rs file in {}, found {}: {:?}",
        dir.display(),
        rs_files.len(),
        rs_files
    );

    Ok(rs_files.remove(0))
}

fn replace_file(src: &Path, dst: &Path) -> anyhow::Result<()> {
    if dst.exists() {
        fs::remove_file(dst)
            .with_context(|| format!("failed removing existing {}", dst.display()))?;
    }

    fs::rename(src, dst).with_context(|| {
        format!(
            "failed to rename `{}` to `{}`",
            src.display(),
            dst.display()
        )
    })
}
