//! Command-line and environment configuration of the `matrix-mul` binary.

use std::env;

use mesh::{DeliveryPolicy, PeerAddr, Rank};

use crate::ConfigError;
use crate::protocol::Shape;

const RETRIES_VAR: &str = "MATRIX_MUL_RETRIES";

pub const USAGE: &str = "\
Usage:
  matrix-mul local <participants> [a_rows a_cols b_cols] [--random]
  matrix-mul node <rank> <addr0,addr1,...> [a_rows a_cols b_cols] [--random]

Rank 0 coordinates, every other rank is a worker.
Environment: MATRIX_MUL_RETRIES sets delivery attempts per message (node mode).";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Every participant as a task of this process.
    Local { participants: usize },
    /// This process is `rank` of a mesh spread over `peers`.
    Node { rank: Rank, peers: Vec<PeerAddr> },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub shape: Shape,
    /// Random operands instead of `i + j`; only the coordinator generates them.
    pub random: bool,
    pub delivery: DeliveryPolicy,
}

impl Config {
    /// Reads the process arguments and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_args(env::args().skip(1))?;
        if let Ok(value) = env::var(RETRIES_VAR) {
            config.delivery.attempts = parse_count(RETRIES_VAR, &value)?;
        }
        Ok(config)
    }

    /// Parses arguments, program name excluded.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let (flags, positional): (Vec<String>, Vec<String>) =
            args.into_iter().partition(|arg| arg.starts_with("--"));

        let mut random = false;
        for flag in flags {
            match flag.as_str() {
                "--random" => random = true,
                _ => {
                    return Err(ConfigError::InvalidArgument {
                        name: "flag",
                        value: flag,
                    });
                }
            }
        }

        let mut positional = positional.into_iter();
        let mode = positional
            .next()
            .ok_or(ConfigError::MissingArgument("mode"))?;
        let mode = match mode.as_str() {
            "local" => {
                let participants = positional
                    .next()
                    .ok_or(ConfigError::MissingArgument("participants"))?;
                Mode::Local {
                    participants: parse_count("participants", &participants)?,
                }
            }
            "node" => {
                let rank = positional
                    .next()
                    .ok_or(ConfigError::MissingArgument("rank"))?;
                let rank = parse_index("rank", &rank)?;
                let peers = positional
                    .next()
                    .ok_or(ConfigError::MissingArgument("peer addresses"))?;
                let peers = parse_peers(&peers)?;
                if rank >= peers.len() {
                    return Err(ConfigError::InvalidArgument {
                        name: "rank",
                        value: rank.to_string(),
                    });
                }
                Mode::Node { rank, peers }
            }
            _ => return Err(ConfigError::UnknownMode(mode)),
        };

        let a_rows = next_dimension(&mut positional, "a_rows", 5)?;
        let a_cols = next_dimension(&mut positional, "a_cols", 32)?;
        let b_cols = next_dimension(&mut positional, "b_cols", 5)?;
        if let Some(extra) = positional.next() {
            return Err(ConfigError::InvalidArgument {
                name: "argument",
                value: extra,
            });
        }

        Ok(Self {
            mode,
            shape: Shape::new(a_rows, a_cols, b_cols),
            random,
            delivery: DeliveryPolicy::default(),
        })
    }
}

fn next_dimension(
    args: &mut impl Iterator<Item = String>,
    name: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    args.next()
        .map_or(Ok(default), |value| parse_count(name, &value))
}

/// A strictly positive count.
fn parse_count(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidArgument {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_index(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

fn parse_peers(list: &str) -> Result<Vec<PeerAddr>, ConfigError> {
    let peers: Vec<PeerAddr> = list
        .split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(PeerAddr::from)
        .collect();
    if peers.is_empty() {
        return Err(ConfigError::InvalidArgument {
            name: "peer addresses",
            value: list.to_string(),
        });
    }
    Ok(peers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn local_mode_with_defaults() {
        let config = Config::from_args(args("local 5")).unwrap();
        assert_eq!(config.mode, Mode::Local { participants: 5 });
        assert_eq!(config.shape, Shape::new(5, 32, 5));
        assert!(!config.random);
    }

    #[test]
    fn node_mode_with_dimensions_and_flag() {
        let config =
            Config::from_args(args("node 1 127.0.0.1:7000,127.0.0.1:7001 --random 4 4 4")).unwrap();
        assert_eq!(
            config.mode,
            Mode::Node {
                rank: 1,
                peers: vec!["127.0.0.1:7000".into(), "127.0.0.1:7001".into()],
            }
        );
        assert_eq!(config.shape, Shape::new(4, 4, 4));
        assert!(config.random);
    }

    #[test]
    fn partial_dimensions_fall_back_to_defaults() {
        let config = Config::from_args(args("local 3 8")).unwrap();
        assert_eq!(config.shape, Shape::new(8, 32, 5));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Config::from_args(args("")).unwrap_err(),
            ConfigError::MissingArgument("mode")
        );
        assert_eq!(
            Config::from_args(args("cluster 3")).unwrap_err(),
            ConfigError::UnknownMode("cluster".into())
        );
        assert!(matches!(
            Config::from_args(args("local 0")),
            Err(ConfigError::InvalidArgument { name: "participants", .. })
        ));
        assert!(matches!(
            Config::from_args(args("node 2 a:1,b:2")),
            Err(ConfigError::InvalidArgument { name: "rank", .. })
        ));
        assert!(matches!(
            Config::from_args(args("local 2 --fast")),
            Err(ConfigError::InvalidArgument { name: "flag", .. })
        ));
        assert!(matches!(
            Config::from_args(args("local 2 1 2 3 4")),
            Err(ConfigError::InvalidArgument { name: "argument", .. })
        ));
    }
}
