//! Fixed file names and values shared with docker-compose and the shell scripts.

/// Suffix marking a file as a template.
pub const TEMPLATE_SUFFIX: &str = ".template";

/// Compose files produced by the render step, in render order.
pub const RENDERED_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose-host.yml",
    "docker-compose-themes.yml",
];

/// Compose file kept in the devstack checkout and never rendered.
pub const WATCHERS_FILE: &str = "docker-compose-watchers.yml";

/// Compose files passed to `down` when tearing the stack down, in order.
pub const TEARDOWN_FILES: &[&str] = &[
    "docker-compose.yml",
    WATCHERS_FILE,
    "docker-compose-host.yml",
    "docker-compose-themes.yml",
];

/// Value exported as `COMPOSE_HTTP_TIMEOUT`.
pub const COMPOSE_HTTP_TIMEOUT: &str = "180";

/// Lock files left behind by npm that break repository updates.
pub const STALE_LOCK_NAME: &str = "package-json.lock";

/// Repository clone/update script and its mode argument.
pub const REPO_SCRIPT: &str = "./repo.sh";
/// Clone over SSH.
pub const REPO_SCRIPT_MODE: &str = "clone_ssh";

/// Provisioning script.
pub const PROVISION_SCRIPT: &str = "./provision.sh";

/// Name of the template file for a rendered file.
pub fn template_name(rendered: &str) -> String {
    format!("{}{}", rendered, TEMPLATE_SUFFIX)
}

/// Build the `-f a -f b` argument string for a list of compose files.
pub fn file_flags(files: &[&str]) -> String {
    files
        .iter()
        .map(|f| format!("-f {}", f))
        .collect::<Vec<_>>()
        .join(" ")
}
