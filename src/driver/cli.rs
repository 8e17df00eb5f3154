//! CLI Argument Parsing
//!
//! CLIの引数解析

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::adapter::config::DEFAULT_CONFIG_PATH;
use crate::domain::entities::video::VideoId;

/// マスター動画をチャンク分割でアップロードし、配信URLを取得するCLI
#[derive(Parser, Debug, Clone)]
#[command(name = "skelclock")]
#[command(about = "Upload the master presentation video and resolve its playback URL", long_about = None)]
pub struct Args {
    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Upload an MP4 file in chunks, then resolve its URL
    Upload {
        /// Video file to upload
        file: PathBuf,

        /// Video title (defaults to the configured title)
        #[arg(long)]
        title: Option<String>,

        /// MIME type (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,

        /// Skip resolving the playback URL after upload
        #[arg(long)]
        no_resolve: bool,
    },

    /// Poll until the playback URL of a video is available
    Resolve {
        /// Video ID
        id: VideoId,
    },

    /// List uploaded videos
    List,

    /// Show metadata of a video
    Info {
        /// Video ID
        id: VideoId,
    },

    /// Remove a video
    Remove {
        /// Video ID
        id: VideoId,
    },

    /// Change the title of a video
    Rename {
        /// Video ID
        id: VideoId,

        /// New title
        title: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_config() {
        let args = Args::parse_from(["skelclock", "list"]);
        assert_eq!(args.config, "./.skelclock/config.json");
        assert_eq!(args.command, Command::List);
    }

    #[test]
    fn test_args_upload_defaults() {
        let args = Args::parse_from(["skelclock", "upload", "talk.mp4"]);
        assert_eq!(
            args.command,
            Command::Upload {
                file: PathBuf::from("talk.mp4"),
                title: None,
                mime: None,
                no_resolve: false,
            }
        );
    }

    #[test]
    fn test_args_upload_options() {
        let args = Args::parse_from([
            "skelclock",
            "upload",
            "talk.mp4",
            "--title",
            "Lecture 3",
            "--mime",
            "video/mp4",
            "--no-resolve",
        ]);
        match args.command {
            Command::Upload {
                title,
                mime,
                no_resolve,
                ..
            } => {
                assert_eq!(title.as_deref(), Some("Lecture 3"));
                assert_eq!(mime.as_deref(), Some("video/mp4"));
                assert!(no_resolve);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_args_custom_config_after_subcommand() {
        let args = Args::parse_from(["skelclock", "resolve", "4", "-c", "/custom/config.json"]);
        assert_eq!(args.config, "/custom/config.json");
        assert_eq!(args.command, Command::Resolve { id: VideoId(4) });
    }

    #[test]
    fn test_args_rename() {
        let args = Args::parse_from(["skelclock", "rename", "2", "New title"]);
        assert_eq!(
            args.command,
            Command::Rename {
                id: VideoId(2),
                title: "New title".to_string(),
            }
        );
    }

    #[test]
    fn test_args_invalid_id() {
        assert!(Args::try_parse_from(["skelclock", "info", "abc"]).is_err());
    }

    #[test]
    fn test_args_requires_subcommand() {
        assert!(Args::try_parse_from(["skelclock"]).is_err());
    }
}
