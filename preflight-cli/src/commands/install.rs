use anyhow::Result;
use clap::Args;
use preflight_core::console;
use preflight_core::fetcher::{MetadataFetcher, RetryPolicy};
use preflight_core::install_cmd::{self, InstallCommand, PackageManager, SaveMode};
use preflight_core::operations;
use preflight_core::registry::{HttpRegistry, RegistryClient};
use preflight_core::stats::{self, GraphStats, LimitReport, LimitViolation, Limits};
use preflight_core::walk::{self, WalkOptions};
use preflight_core::{PackageGraph, PreflightConfig, Project};
use std::collections::BTreeMap;
use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Package to consider, e.g. express, express@^4 or @scope/pkg@1.2.0
    pub package: Option<String>,
    /// Save to dependencies when delegating the install
    #[arg(short = 'S', long)]
    pub save: bool,
    /// Save to devDependencies when delegating the install
    #[arg(short = 'D', long = "save-dev")]
    pub save_dev: bool,
    /// Skip devDependencies when auditing the project manifest
    #[arg(long)]
    pub production: bool,
    /// Print license details as JSON on stdout and exit
    #[arg(long)]
    pub pipe: bool,
    /// Exit non-zero when manifest limits are exceeded
    #[arg(long)]
    pub test: bool,
}

pub async fn run(args: InstallArgs, config: &PreflightConfig) -> Result<()> {
    if !args.pipe {
        console::header("install", env!("CARGO_PKG_VERSION"));
    }

    let cwd = env::current_dir()?;
    let fetcher = MetadataFetcher::new(HttpRegistry::new(config), RetryPolicy::from_config(config));
    let options = WalkOptions::from_config(config);

    match args.package.as_deref() {
        Some(spec) => audit_package(spec, &args, &fetcher, &options, &cwd).await,
        None => audit_project(&args, &fetcher, &options, &cwd).await,
    }
}

async fn audit_package<R: RegistryClient>(
    spec: &str,
    args: &InstallArgs,
    fetcher: &MetadataFetcher<R>,
    options: &WalkOptions,
    cwd: &Path,
) -> Result<()> {
    let (name, range) = parse_spec(spec);

    let target = fetcher.resolve(&name, &range).await?;

    if !args.pipe {
        console::info(&format!(
            "{} (updated {})",
            console::bold(&target.id.to_string()),
            console::relative_time(target.modified_at)
        ));
    }

    let mut roots = BTreeMap::new();
    roots.insert(name, range);

    let graph = walk_with_status(fetcher, &roots, options, args.pipe).await?;

    if args.pipe {
        println!("{}", operations::details_to_json(&graph)?);
        return Ok(());
    }

    print_quick_stats(&stats::aggregate(&graph));

    if args.test {
        console::warn("--test only applies to project audits; ignoring");
    }

    menu_loop(
        &graph,
        fetcher,
        options,
        cwd,
        Some(spec),
        save_mode(args),
        args.production,
    )
    .await
}

async fn audit_project<R: RegistryClient>(
    args: &InstallArgs,
    fetcher: &MetadataFetcher<R>,
    options: &WalkOptions,
    cwd: &Path,
) -> Result<()> {
    let project = Project::discover(cwd)?;

    if !args.pipe {
        console::info(&console::bold(&project.label()));
    }

    let roots = project.root_dependencies(!args.production);
    let graph = walk_with_status(fetcher, &roots, options, args.pipe).await?;

    if args.pipe {
        println!("{}", operations::details_to_json(&graph)?);
        return Ok(());
    }

    let stats = stats::aggregate(&graph);
    let report = stats::check_limits(&stats, &project.manifest.config);
    print_stats_table(&stats, &project.manifest.config, &report);

    if args.test {
        if !report.is_ok() {
            for violation in report.violations.iter() {
                console::error(&violation.describe());
            }
            process::exit(1);
        }
        return Ok(());
    }

    menu_loop(
        &graph,
        fetcher,
        options,
        cwd,
        None,
        SaveMode::None,
        args.production,
    )
    .await
}

async fn walk_with_status<R: RegistryClient>(
    fetcher: &MetadataFetcher<R>,
    roots: &BTreeMap<String, String>,
    options: &WalkOptions,
    quiet: bool,
) -> preflight_core::Result<PackageGraph> {
    let mut fetched = 0usize;

    let result = walk::walk_with_progress(fetcher, roots, options, |_| {
        fetched += 1;
        if !quiet {
            console::status_count("fetching dependencies", fetched);
        }
    })
    .await;

    if !quiet {
        console::clear_line();
    }

    result
}

fn save_mode(args: &InstallArgs) -> SaveMode {
    if args.save_dev {
        SaveMode::SaveDev
    } else if args.save {
        SaveMode::Save
    } else {
        SaveMode::None
    }
}

fn print_quick_stats(stats: &GraphStats) {
    let licenses = stats.license_histogram.len();
    console::info(&format!(
        "{} package{}, {}, {} license{}",
        stats.count,
        if stats.count == 1 { "" } else { "s" },
        console::format_size(stats.total_size_bytes),
        licenses,
        if licenses == 1 { "" } else { "s" },
    ));
}

fn print_stats_table(stats: &GraphStats, limits: &Limits, report: &LimitReport) {
    let count_cell = match limits.max_packages_number {
        Some(max) => limit_cell(
            max.to_string(),
            report
                .violations
                .iter()
                .any(|v| matches!(v, LimitViolation::PackageCount { .. })),
        ),
        None => String::new(),
    };

    let size_cell = match limits.max_size_bytes {
        Some(max) => limit_cell(
            console::format_size(max),
            report
                .violations
                .iter()
                .any(|v| matches!(v, LimitViolation::TotalSize { .. })),
        ),
        None => String::new(),
    };

    println!();
    println!("{:<10}  {:<14}  {:<5}  {}", "Packages", stats.count, "", count_cell);
    println!(
        "{:<10}  {:<14}  {:<5}  {}",
        "Size",
        console::format_size(stats.total_size_bytes),
        "",
        size_cell
    );

    for (index, (license, count)) in stats.license_histogram.iter().enumerate() {
        let label = if index == 0 { "Licenses" } else { "" };

        let check = if limits.allowed_license_types.is_empty() {
            String::new()
        } else {
            let violated = report.violations.iter().any(
                |v| matches!(v, LimitViolation::License { license: l, .. } if l == license),
            );
            if violated {
                console::red("x")
            } else {
                console::green("\u{2713}")
            }
        };

        println!("{:<10}  {:<14}  {:<5}  {}", label, license, count, check);
    }
}

fn limit_cell(max: String, violated: bool) -> String {
    if violated {
        console::red(&format!(">  {}", max))
    } else {
        console::green(&format!("<= {}", max))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NextAction {
    Install,
    Impact,
    Details,
    Export,
    Skip,
}

/// Explicit menu loop: actions other than Install and Skip render their view
/// and come back to the prompt.
async fn menu_loop<R: RegistryClient>(
    graph: &PackageGraph,
    fetcher: &MetadataFetcher<R>,
    options: &WalkOptions,
    cwd: &Path,
    package_spec: Option<&str>,
    save: SaveMode,
    production: bool,
) -> Result<()> {
    if !atty::is(atty::Stream::Stdin) || !atty::is(atty::Stream::Stdout) {
        return Ok(());
    }

    let project_root = Project::discover(cwd)
        .map(|project| project.root)
        .unwrap_or_else(|_| cwd.to_path_buf());
    let manager = PackageManager::detect(&project_root);
    let command = install_cmd::install_command(manager, package_spec, save, production);

    let with_impact = package_spec.is_some();
    let mut baseline: Option<PackageGraph> = None;

    loop {
        match prompt_next(&command, with_impact)? {
            NextAction::Install => {
                let status = command.exec(cwd)?;
                process::exit(status.code().unwrap_or(1));
            }
            NextAction::Impact => {
                if baseline.is_none() {
                    baseline = Some(baseline_graph(fetcher, options, cwd, production).await?);
                }
                if let Some(base) = baseline.as_ref() {
                    print_impact(graph, base);
                }
            }
            NextAction::Details => print_details_table(graph),
            NextAction::Export => export_interactive(graph)?,
            NextAction::Skip => break,
        }
    }

    Ok(())
}

/// What the project already pulls in, for the impact diff. No manifest
/// means an empty baseline: everything counts as new.
async fn baseline_graph<R: RegistryClient>(
    fetcher: &MetadataFetcher<R>,
    options: &WalkOptions,
    cwd: &Path,
    production: bool,
) -> Result<PackageGraph> {
    match Project::discover(cwd) {
        Ok(project) => {
            let roots = project.root_dependencies(!production);
            Ok(walk_with_status(fetcher, &roots, options, false).await?)
        }
        Err(_) => Ok(PackageGraph::default()),
    }
}

fn print_impact(candidate: &PackageGraph, baseline: &PackageGraph) {
    let report = operations::impact(candidate, baseline);

    if report.new_packages.is_empty() {
        console::info("No new packages; this project already depends on all of them.");
        return;
    }

    console::info(&format!(
        "{} new package{}, {}",
        report.stats.count,
        if report.stats.count == 1 { "" } else { "s" },
        console::format_size(report.stats.total_size_bytes)
    ));

    for id in report.new_packages.iter() {
        console::info(&format!("{} {}", console::green("+"), id));
    }
}

fn print_details_table(graph: &PackageGraph) {
    let rows = operations::details_rows(graph);

    let mut name_width = "name".len();
    let mut version_width = "version".len();
    let mut license_width = "license".len();

    for row in rows.iter() {
        name_width = name_width.max(row.name.len());
        version_width = version_width.max(row.version.len());
        license_width = license_width.max(row.license.len());
    }

    println!();
    println!(
        "{:<name_width$}  {:<version_width$}  {:<license_width$}  {:<10}  {}",
        "name",
        "version",
        "license",
        "size",
        "modified",
        name_width = name_width,
        version_width = version_width,
        license_width = license_width,
    );

    for row in rows.iter() {
        let modified = row
            .modified
            .as_deref()
            .and_then(|stamp| stamp.split('T').next())
            .unwrap_or("-");

        println!(
            "{:<name_width$}  {:<version_width$}  {:<license_width$}  {:<10}  {}",
            row.name,
            row.version,
            row.license,
            console::format_size(row.size_bytes),
            modified,
            name_width = name_width,
            version_width = version_width,
            license_width = license_width,
        );
    }
}

fn export_interactive(graph: &PackageGraph) -> Result<()> {
    let input = read_line("File to export to (licenseDetails.json): ")?.unwrap_or_default();
    let file_name = operations::export_file_name(&input);

    console::status("Writing license details...");
    operations::export_details(graph, Path::new(&file_name))?;
    console::clear_line();
    console::info(&console::green(&format!(
        "License details written to {}",
        file_name
    )));

    Ok(())
}

fn prompt_next(command: &InstallCommand, with_impact: bool) -> Result<NextAction> {
    let mut choices: Vec<(NextAction, String)> = Vec::new();

    choices.push((
        NextAction::Install,
        format!("Install ({})", console::bold(&command.display())),
    ));
    if with_impact {
        choices.push((NextAction::Impact, "Impact".to_string()));
    }
    choices.push((NextAction::Details, "Details (Show)".to_string()));
    choices.push((NextAction::Export, "Details (Export to JSON)".to_string()));
    choices.push((NextAction::Skip, "Skip".to_string()));

    println!();
    console::info("What is next?");
    for (index, (_, label)) in choices.iter().enumerate() {
        console::info(&format!("  {}) {}", index + 1, label));
    }

    loop {
        let Some(line) = read_line(&format!("Choose 1-{}: ", choices.len()))? else {
            // stdin closed mid-session
            return Ok(NextAction::Skip);
        };

        match line.trim().parse::<usize>() {
            Ok(pick) if (1..=choices.len()).contains(&pick) => return Ok(choices[pick - 1].0),
            _ => console::warn(&format!("enter a number between 1 and {}", choices.len())),
        }
    }
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().read_line(&mut line)?;

    Ok(if read == 0 { None } else { Some(line) })
}

fn parse_spec(spec: &str) -> (String, String) {
    if spec.starts_with('@') {
        let without_at = &spec[1..];
        if let Some(idx) = without_at.rfind('@') {
            let (scope_and_name, range) = without_at.split_at(idx);
            let name = format!("@{}", scope_and_name);
            let requested = range.trim_start_matches('@').to_string();
            return (name, requested);
        }
        return (spec.to_string(), "latest".to_string());
    }

    if let Some(idx) = spec.rfind('@') {
        let (name, range) = spec.split_at(idx);
        (name.to_string(), range.trim_start_matches('@').to_string())
    } else {
        (spec.to_string(), "latest".to_string())
    }
}
