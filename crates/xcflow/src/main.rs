use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::env;
use std::path::{Path, PathBuf};

use xcflow_sdk::{
    ArtifactTree, BuildRequest, Channel, Configuration, PackageOptions, RunLock, RunMeta, Sdk,
    TestOptions, Xcodebuild, phases,
};

use config::{CONFIG_FILE_NAME, FlowConfig};

mod config;

/// CI build orchestrator for Xcode projects: clean, build, test, and package
/// from one entry point.
#[derive(Parser, Debug)]
#[command(
    name = "xcflow",
    author,
    version,
    about = "CI build orchestrator for Xcode projects",
    long_about = None
)]
struct Cli {
    /// Run the build phase
    #[arg(short = 'b', long)]
    build: bool,

    /// Run the test phase
    #[arg(short = 't', long)]
    test: bool,

    /// Run the package phase
    #[arg(short = 'm', long = "package")]
    package: bool,

    /// Release channel selecting the build variant
    #[arg(long, value_enum, default_value_t = ChannelArg::Local)]
    channel: ChannelArg,

    /// Path to the config file (default: discover xcflow.toml upward from cwd)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Artifact root (default: $WORKSPACE/build, else <project dir>/build)
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Echo toolchain commands before running them
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
#[clap(rename_all = "lowercase")]
enum ChannelArg {
    Local,
    Distribution,
    Enterprise,
}

impl From<ChannelArg> for Channel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Local => Channel::Local,
            ChannelArg::Distribution => Channel::Distribution,
            ChannelArg::Enterprise => Channel::Enterprise,
        }
    }
}

/// Which of the three phases run; clean always runs regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SelectedPhases {
    build: bool,
    test: bool,
    package: bool,
}

impl SelectedPhases {
    /// No phase flags means the full pipeline; any subset means exactly that
    /// subset.
    fn from_flags(build: bool, test: bool, package: bool) -> Self {
        if !(build || test || package) {
            return Self {
                build: true,
                test: true,
                package: true,
            };
        }
        Self {
            build,
            test,
            package,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let channel: Channel = cli.channel.into();
    let selected = SelectedPhases::from_flags(cli.build, cli.test, cli.package);

    let (config, config_path) = resolve_config(cli.config.as_deref())?;
    let config_root = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = dotenvy::from_path(config_root.join(".env.local"));

    let artifacts_root = resolve_artifacts_root(cli.artifacts.clone(), &config_root);
    let tree = ArtifactTree::new(&artifacts_root);
    let _lock = RunLock::acquire(&tree)?;

    println!(
        "xcflow: project {} (channel {})",
        config.project.name,
        channel.as_str()
    );

    // Clean runs first, unconditionally.
    println!("Cleaning artifact tree at {:?}", tree.root());
    tree.reset().context("resetting artifact tree")?;
    let mut executed = vec!["clean"];

    let toolchain = Xcodebuild::new().verbose(cli.verbose);
    let project_path = config.project_path(&config_root);

    if selected.build {
        let req = BuildRequest::for_channel(
            channel,
            &project_path,
            config.target(),
            &config.bundle_ids(),
            &config.overlays(&config_root),
        );
        let output = phases::build::run(&toolchain, &tree, &req)?;
        println!("✓ Build installed into {:?}", output.install_dir);
        if let Some(archive) = &output.dsym_archive {
            println!("  dSYM archive: {:?}", archive);
        }
        executed.push("build");
    }

    if selected.test {
        let opts = TestOptions {
            project: project_path.clone(),
            test_target: config.test_target(),
            daemon_helper: config.daemon_helper(&config_root),
        };
        phases::test::run(&toolchain, &tree, &opts)?;
        executed.push("test");
    }

    if selected.package {
        let opts = PackageOptions {
            channel,
            project_name: config.project.name.clone(),
            app_path: release_app_path(&tree, config.target()),
            profile: config.profile_path(channel)?,
            identity: config.signing_identity().to_string(),
        };
        phases::package::run(&tree, &opts)?;
        executed.push("package");
    }

    RunMeta::capture(&config.project.name, channel, &executed).write(&tree)?;
    println!("✓ Run complete: {}", executed.join(" → "));
    Ok(())
}

fn resolve_config(explicit: Option<&Path>) -> Result<(FlowConfig, PathBuf)> {
    if let Some(path) = explicit {
        let config = FlowConfig::load_from_file(path)?;
        return Ok((config, path.to_path_buf()));
    }
    let cwd = env::current_dir().context("resolving current directory")?;
    match FlowConfig::discover_from(&cwd)? {
        Some(found) => Ok(found),
        None => bail!(
            "no {CONFIG_FILE_NAME} found in {:?} or its parents; \
             create one with a [project] name and [bundle] identifiers",
            cwd
        ),
    }
}

/// Artifact root precedence: --artifacts, then $WORKSPACE/build, then
/// <config dir>/build.
fn resolve_artifacts_root(flag: Option<PathBuf>, config_root: &Path) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    match env::var("WORKSPACE") {
        Ok(workspace) if !workspace.is_empty() => PathBuf::from(workspace).join("build"),
        _ => config_root.join("build"),
    }
}

/// Where `xcodebuild install` places the release app: DSTROOT/Applications.
fn release_app_path(tree: &ArtifactTree, target: &str) -> PathBuf {
    tree.install_dir(Configuration::Release, Sdk::Device)
        .join("Applications")
        .join(format!("{target}.app"))
}
