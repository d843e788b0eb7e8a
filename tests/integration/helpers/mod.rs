//! Shared helpers for integration tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ampliscreen_lib::config::ResourceConfig;

/// A resource config with intervals tightened for tests. The admission
/// floor is one byte so any host admits immediately.
pub fn fast_config() -> ResourceConfig {
    ResourceConfig {
        job_memory_ceiling: 256 * 1024 * 1024,
        min_free_memory: 1,
        admission_poll_interval: Duration::from_millis(10),
        admission_timeout: Duration::from_secs(5),
        watchdog_poll_interval: Duration::from_millis(10),
        workers: 4,
        deadline: None,
    }
}

/// Write an executable shell script acting as the external search tool and
/// return its absolute path.
pub fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A stub tool that echoes its stdin, so an "assembly" file's contents are
/// returned verbatim as the search output. Assemblies containing the FAIL
/// marker make the tool exit non-zero; the SLEEP marker makes it hang.
pub fn marker_tool(dir: &Path) -> PathBuf {
    write_tool(
        dir,
        "stub-search",
        r#"c=$(cat)
case "$c" in
  *FAIL*) exit 3 ;;
  *SLEEP*) exec sleep 30 ;;
esac
printf '%s\n' "$c""#,
    )
}

/// A stub tool that echoes stdin only when the allowed mismatch count
/// (argument 6 of the fixed invocation) is at or below `max_level`.
pub fn level_gated_tool(dir: &Path, max_level: u32) -> PathBuf {
    write_tool(
        dir,
        "gated-search",
        &format!(
            r#"c=$(cat)
if [ "$6" -le {max_level} ]; then printf '%s\n' "$c"; fi"#
        ),
    )
}

/// A stub tool that swallows stdin and reports nothing, like a search that
/// finds no amplicon.
pub fn silent_tool(dir: &Path) -> PathBuf {
    write_tool(dir, "silent-search", "cat > /dev/null")
}

/// A BED-style match line whose amplicon (column 7) has `len` bases.
pub fn bed_line(len: usize) -> String {
    format!("chr1\t100\t{}\tamp\t0\t+\t{}", 100 + len, "A".repeat(len))
}

/// Create a directory of "assembly" files with the given (name, contents)
/// pairs and return its path.
pub fn assembly_dir(dir: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    fs::create_dir(&path).unwrap();
    for (file, contents) in files {
        fs::write(path.join(file), contents).unwrap();
    }
    path
}
