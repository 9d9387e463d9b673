use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use gencert::chain::GeneratedChain;
use tracing::debug;

/// Certificates are world-readable.
const CERTIFICATE_MODE: u32 = 0o644;
/// Private keys are readable by the owner only.
const PRIVATE_KEY_MODE: u32 = 0o600;

/// Writes `<name>.pem` and `<name>.key` for every entry of `chain` into `out_dir`, creating the
/// directory if needed. Returns the written paths in order.
pub fn write_chain(out_dir: &Path, chain: &GeneratedChain) -> Result<Vec<PathBuf>> {
    for entry in chain.iter() {
        if entry.name.is_empty() || entry.name.contains(['/', '\\']) || entry.name == ".." {
            bail!("{:?} cannot be used as a file name", entry.name);
        }
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(chain.len() * 2);
    for entry in chain.iter() {
        let cert_path = out_dir.join(format!("{}.pem", entry.name));
        write_file(
            &cert_path,
            entry.material.certificate_pem().as_bytes(),
            CERTIFICATE_MODE,
        )?;
        written.push(cert_path);

        let key_path = out_dir.join(format!("{}.key", entry.name));
        write_file(
            &key_path,
            entry.material.private_key_pem().as_bytes(),
            PRIVATE_KEY_MODE,
        )?;
        written.push(key_path);
    }
    Ok(written)
}

fn write_file(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    // An existing file keeps its old mode when opened, so set it explicitly.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(mode))
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    file.write_all(contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
}
