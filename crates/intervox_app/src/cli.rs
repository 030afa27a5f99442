use crate::logging::LogDestination;

pub const USAGE: &str = "\
intervox_app <command> [options]

Commands:
  projects                 List projects on the backend
  records <project>        List records for a project
  clean <project>          Run bulk text cleanup + intonation annotation
      --prompt TEXT        Free-form context prompt for the run
      --keep-texts         Do not overwrite existing cleaned texts
      --keep-prompts       Do not overwrite existing intonation prompts
  synthesize <project>     Run bulk audio synthesis
  delete <project>         Delete a project and its data
  history                  Show finished runs recorded on this machine

Options:
  --base-url URL           Backend address (default http://localhost:8000)
  --log DEST               terminal | file | both (default terminal)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Projects,
    Records {
        project_id: String,
    },
    Clean {
        project_id: String,
        prompt: Option<String>,
        keep_texts: bool,
        keep_prompts: bool,
    },
    Synthesize {
        project_id: String,
    },
    Delete {
        project_id: String,
    },
    History,
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: Command,
    pub base_url: String,
    pub log_destination: LogDestination,
}

pub fn parse(args: &[String]) -> Result<Invocation, String> {
    let mut base_url = "http://localhost:8000".to_string();
    let mut log_destination = LogDestination::Terminal;
    let mut positional: Vec<&str> = Vec::new();
    let mut prompt = None;
    let mut keep_texts = false;
    let mut keep_prompts = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--base-url" => {
                base_url = iter
                    .next()
                    .ok_or_else(|| "--base-url requires a value".to_string())?
                    .clone();
            }
            "--log" => {
                log_destination = match iter
                    .next()
                    .ok_or_else(|| "--log requires a value".to_string())?
                    .as_str()
                {
                    "terminal" => LogDestination::Terminal,
                    "file" => LogDestination::File,
                    "both" => LogDestination::Both,
                    other => return Err(format!("unknown log destination: {other}")),
                };
            }
            "--prompt" => {
                prompt = Some(
                    iter.next()
                        .ok_or_else(|| "--prompt requires a value".to_string())?
                        .clone(),
                );
            }
            "--keep-texts" => keep_texts = true,
            "--keep-prompts" => keep_prompts = true,
            other if other.starts_with("--") => {
                return Err(format!("unknown option: {other}"));
            }
            other => positional.push(other),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional.next().ok_or_else(|| "missing command".to_string())?;

    let mut project = |command: &str| {
        positional
            .next()
            .map(str::to_string)
            .ok_or_else(|| format!("{command} requires a <project> argument"))
    };

    let command = match name {
        "projects" => Command::Projects,
        "records" => Command::Records {
            project_id: project("records")?,
        },
        "clean" => Command::Clean {
            project_id: project("clean")?,
            prompt: prompt.take(),
            keep_texts,
            keep_prompts,
        },
        "synthesize" => Command::Synthesize {
            project_id: project("synthesize")?,
        },
        "delete" => Command::Delete {
            project_id: project("delete")?,
        },
        "history" => Command::History,
        other => return Err(format!("unknown command: {other}")),
    };

    Ok(Invocation {
        command,
        base_url,
        log_destination,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse, Command};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_projects_command() {
        let invocation = parse(&args(&["projects"])).unwrap();
        assert_eq!(invocation.command, Command::Projects);
        assert_eq!(invocation.base_url, "http://localhost:8000");
    }

    #[test]
    fn parses_clean_with_flags() {
        let invocation = parse(&args(&[
            "clean",
            "P1",
            "--prompt",
            "warm tone",
            "--keep-texts",
        ]))
        .unwrap();
        assert_eq!(
            invocation.command,
            Command::Clean {
                project_id: "P1".to_string(),
                prompt: Some("warm tone".to_string()),
                keep_texts: true,
                keep_prompts: false,
            }
        );
    }

    #[test]
    fn global_flags_may_precede_the_command() {
        let invocation = parse(&args(&["--base-url", "http://backend:9000", "synthesize", "P2"]))
            .unwrap();
        assert_eq!(invocation.base_url, "http://backend:9000");
        assert_eq!(
            invocation.command,
            Command::Synthesize {
                project_id: "P2".to_string(),
            }
        );
    }

    #[test]
    fn missing_project_is_rejected() {
        assert!(parse(&args(&["records"])).is_err());
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(parse(&args(&["transcribe"])).is_err());
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert!(parse(&args(&["projects", "--verbose"])).is_err());
    }
}
