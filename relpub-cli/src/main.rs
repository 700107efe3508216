use anyhow::{Context, Error, Result};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use log::error;
use relpub::{Published, Publisher, PublisherBuilder, DEFAULT_CONTENT_TYPE};
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
enum RelpubError {
    #[error("{0:}")]
    InvalidArgsError(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cmd = cmd();
    let matches = cmd.get_matches();
    let res = init_logger_from_matches(&matches);
    if let Err(e) = res {
        eprintln!("Error creating logger: {e}");
        std::process::exit(126);
    }

    std::process::exit(run(&matches).await);
}

const MAX_TERM_WIDTH: usize = 100;
const RULE_WIDTH: usize = 70;

fn cmd() -> Command {
    Command::new("relpub")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Dave Rolsky <autarch@urth.org>")
        .about("Create a GitHub release and upload one file to it")
        .after_help(concat!(
            "The GitHub token is read from the GITHUB_TOKEN environment variable. It needs",
            " permission to create releases in the project, which is the `repo` scope for a",
            " classic token. You can create one at https://github.com/settings/tokens.",
        ))
        .arg(
            Arg::new("project")
                .long("project")
                .short('p')
                .required(true)
                .help(concat!(
                    "The project to publish to, like houseabsolute/precious",
                    " or https://github.com/houseabsolute/precious.",
                )),
        )
        .arg(
            Arg::new("tag")
                .long("tag")
                .short('t')
                .required(true)
                .help("The tag for the new release, like v1.2.0."),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .short('n')
                .help("The display name for the release. Defaults to the tag."),
        )
        .arg(
            Arg::new("body")
                .long("body")
                .short('b')
                .help("The release notes, as Markdown."),
        )
        .arg(
            Arg::new("body-file")
                .long("body-file")
                .help("A file containing the release notes, as Markdown."),
        )
        .group(ArgGroup::new("notes").args(["body", "body-file"]))
        .arg(Arg::new("file").long("file").short('f').required(true).help(concat!(
            "The file to upload to the release. The asset will be named after the file's",
            " base name.",
        )))
        .arg(
            Arg::new("content-type")
                .long("content-type")
                .default_value(DEFAULT_CONTENT_TYPE)
                .help("The Content-Type to send with the uploaded file."),
        )
        .arg(
            Arg::new("draft")
                .long("draft")
                .action(ArgAction::SetTrue)
                .help("Create the release as a draft."),
        )
        .arg(
            Arg::new("prerelease")
                .long("prerelease")
                .action(ArgAction::SetTrue)
                .help("Mark the release as a prerelease."),
        )
        .arg(Arg::new("api-base-url").long("api-base-url").help(concat!(
            "The the base URL for the GitHub API. This is useful for testing or if you want",
            " to publish to an Enterprise version of GitHub. This should be something like",
            " `https://github.my-corp.example.com/api/v3`.",
        )))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Show progress while the release is created and the file is uploaded."),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debugging output."),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppresses most output."),
        )
        .group(ArgGroup::new("log-level").args(["verbose", "debug", "quiet"]))
        .max_term_width(MAX_TERM_WIDTH)
}

pub(crate) fn init_logger_from_matches(matches: &ArgMatches) -> Result<(), log::SetLoggerError> {
    relpub::init_logger(log_level(matches))
}

fn log_level(matches: &ArgMatches) -> log::LevelFilter {
    if matches.get_flag("debug") {
        log::LevelFilter::Debug
    } else if matches.get_flag("verbose") {
        log::LevelFilter::Info
    } else if matches.get_flag("quiet") {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    }
}

async fn run(matches: &ArgMatches) -> i32 {
    let body = match read_body(matches) {
        Ok(b) => b,
        Err(e) => {
            print_err(&e);
            return 1;
        }
    };
    let publisher = match make_publisher(matches, body.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            print_err(&e);
            return 1;
        }
    };

    let quiet = matches.get_flag("quiet");
    if !quiet {
        println!("{}", banner(&publisher));
    }

    match publisher.publish().await {
        Ok(published) => {
            if !quiet {
                println!("{}", success_message(&published));
            }
            0
        }
        Err(e) => {
            print_err(&e);
            1
        }
    }
}

fn read_body(matches: &ArgMatches) -> Result<Option<String>> {
    if let Some(b) = matches.get_one::<String>("body") {
        return Ok(Some(b.clone()));
    }
    matches
        .get_one::<String>("body-file")
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("could not read release notes from {path}"))
        })
        .transpose()
}

fn make_publisher<'a>(matches: &'a ArgMatches, body: Option<&'a str>) -> Result<Publisher> {
    validate_args(matches)?;

    let mut builder = PublisherBuilder::new();
    if let Some(p) = matches.get_one::<String>("project") {
        builder = builder.project(p);
    }
    if let Some(t) = matches.get_one::<String>("tag") {
        builder = builder.tag(t);
    }
    if let Some(n) = matches.get_one::<String>("name") {
        builder = builder.name(n);
    }
    if let Some(b) = body {
        builder = builder.body(b);
    }
    if let Some(f) = matches.get_one::<String>("file") {
        builder = builder.file(Path::new(f));
    }
    if let Some(ct) = matches.get_one::<String>("content-type") {
        builder = builder.content_type(ct);
    }
    if matches.get_flag("draft") {
        builder = builder.draft();
    }
    if matches.get_flag("prerelease") {
        builder = builder.prerelease();
    }
    if let Some(url) = matches.get_one::<String>("api-base-url") {
        builder = builder.api_base_url(url);
    }

    builder.build()
}

fn validate_args(matches: &ArgMatches) -> Result<()> {
    for a in &["project", "tag", "name", "file", "content-type"] {
        if matches
            .get_one::<String>(a)
            .is_some_and(|v| v.trim().is_empty())
        {
            return Err(
                RelpubError::InvalidArgsError(format!("The --{a} option cannot be empty")).into(),
            );
        }
    }

    Ok(())
}

fn banner(publisher: &Publisher) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "{rule}\nrelpub {}\n{rule}\n\nRelease file: {}\n",
        env!("CARGO_PKG_VERSION"),
        publisher.release_file_summary(),
    )
}

fn success_message(published: &Published) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let url = published
        .html_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .unwrap_or("(not returned by GitHub)");
    format!(
        "\n{rule}\nSUCCESS! Release published to GitHub\n{rule}\n\nAsset: {} ({} bytes)\nRelease URL: {url}\n",
        published.asset_name, published.asset_size,
    )
}

fn print_err(e: &Error) {
    error!("{e:#}");
    if let Some(re) = e.downcast_ref::<RelpubError>() {
        match re {
            RelpubError::InvalidArgsError(_) => {
                println!();
                if let Err(e) = cmd().print_help() {
                    eprintln!("Error printing help: {e}");
                }
            }
        }
    }
}
