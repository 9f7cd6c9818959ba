//! Parsing of client command lines.
//!
//! One command per line, tokens separated by whitespace. The verb is
//! case-insensitive; names and game ids are kept as sent. PLAY accepts
//! optional `key=value` arguments after the card index.

use std::str::FromStr;

use crate::cards::Color;
use crate::core::{GameError, PlayerId};
use crate::rules::PlayRequest;

/// A parsed client command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `CREATE <name> [maxPlayers]`
    Create { name: String, max_players: usize },
    /// `JOIN <gameId> <name>`
    Join { game_id: String, name: String },
    /// `START`
    Start,
    /// `PLAY <cardIndex> [color=<c>] [value=<n>] [target=<playerId>]`
    Play(PlayRequest),
    /// `DRAW`, when no card in hand can be played.
    Draw,
    /// `STATE [gameId]`; a game id asks for a spectator view.
    State { game_id: Option<String> },
    /// `LEAVE`
    Leave,
}

impl Command {
    /// Verb as written on the wire.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Create { .. } => "CREATE",
            Command::Join { .. } => "JOIN",
            Command::Start => "START",
            Command::Play(_) => "PLAY",
            Command::Draw => "DRAW",
            Command::State { .. } => "STATE",
            Command::Leave => "LEAVE",
        }
    }

    /// Does this command change session state?
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Command::State { .. })
    }
}

fn malformed(message: impl Into<String>) -> GameError {
    GameError::MalformedCommand(message.into())
}

fn no_more(tokens: &mut std::str::SplitWhitespace<'_>, verb: &str) -> Result<(), GameError> {
    match tokens.next() {
        Some(extra) => Err(malformed(format!("unexpected argument '{extra}' to {verb}"))),
        None => Ok(()),
    }
}

fn parse_play(tokens: &mut std::str::SplitWhitespace<'_>) -> Result<PlayRequest, GameError> {
    let index = tokens.next().ok_or_else(|| malformed("usage: PLAY <cardIndex>"))?;
    let card_index = index
        .parse::<usize>()
        .map_err(|_| malformed(format!("card index '{index}' is not a number")))?;
    let mut request = PlayRequest::card(card_index);

    for arg in tokens {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| malformed(format!("expected key=value, got '{arg}'")))?;
        match key.to_ascii_lowercase().as_str() {
            "color" if request.color.is_none() => {
                request.color = Some(Color::from_str(value).map_err(malformed)?);
            }
            "value" if request.value.is_none() => {
                request.value = Some(
                    value
                        .parse()
                        .map_err(|_| malformed(format!("value '{value}' is not a number")))?,
                );
            }
            "target" if request.target.is_none() => {
                request.target = Some(
                    value
                        .parse::<PlayerId>()
                        .map_err(|_| malformed(format!("target '{value}' is not a player id")))?,
                );
            }
            "color" | "value" | "target" => return Err(malformed(format!("'{key}' given twice"))),
            other => return Err(malformed(format!("unknown argument '{other}'"))),
        }
    }
    Ok(request)
}

impl FromStr for Command {
    type Err = GameError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().ok_or_else(|| malformed("empty command"))?.to_ascii_uppercase();

        let command = match verb.as_str() {
            "CREATE" => {
                let name = tokens.next().ok_or_else(|| malformed("usage: CREATE <name> [maxPlayers]"))?;
                let max_players = match tokens.next() {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| malformed(format!("maxPlayers '{raw}' is not a number")))?,
                    // Out of range: the registry falls back to the maximum.
                    None => 0,
                };
                Command::Create {
                    name: name.to_string(),
                    max_players,
                }
            }
            "JOIN" => {
                let (Some(game_id), Some(name)) = (tokens.next(), tokens.next()) else {
                    return Err(malformed("usage: JOIN <gameId> <name>"));
                };
                Command::Join {
                    game_id: game_id.to_string(),
                    name: name.to_string(),
                }
            }
            "START" => Command::Start,
            "PLAY" => return parse_play(&mut tokens).map(Command::Play),
            "DRAW" => Command::Draw,
            "STATE" => Command::State {
                game_id: tokens.next().map(str::to_string),
            },
            "LEAVE" => Command::Leave,
            other => return Err(malformed(format!("unknown command '{other}'"))),
        };

        no_more(&mut tokens, &verb)?;
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    fn parse(line: &str) -> Result<Command, GameError> {
        line.parse()
    }

    #[test]
    fn test_parse_create() {
        assert_eq!(
            parse("CREATE ALICE 4").unwrap(),
            Command::Create {
                name: "ALICE".into(),
                max_players: 4
            }
        );
        assert_eq!(
            parse("create bob").unwrap(),
            Command::Create {
                name: "bob".into(),
                max_players: 0
            }
        );
        assert_eq!(parse("CREATE ALICE four").unwrap_err().kind(), ErrorKind::MalformedCommand);
    }

    #[test]
    fn test_parse_join() {
        assert_eq!(
            parse("  join game-1   BOB ").unwrap(),
            Command::Join {
                game_id: "game-1".into(),
                name: "BOB".into()
            }
        );
        assert!(parse("JOIN game-1").is_err());
    }

    #[test]
    fn test_parse_play_plain() {
        assert_eq!(parse("PLAY 3").unwrap(), Command::Play(PlayRequest::card(3)));
        assert!(parse("PLAY").is_err());
        assert!(parse("PLAY -1").is_err());
    }

    #[test]
    fn test_parse_play_arguments() {
        let command = parse("play 0 color=Blue value=7").unwrap();
        assert_eq!(
            command,
            Command::Play(PlayRequest {
                card_index: 0,
                color: Some(Color::Blue),
                value: Some(7),
                target: None,
            })
        );

        let command = parse("PLAY 2 target=1").unwrap();
        assert_eq!(
            command,
            Command::Play(PlayRequest {
                target: Some(PlayerId::new(1)),
                ..PlayRequest::card(2)
            })
        );
    }

    #[test]
    fn test_parse_play_bad_arguments() {
        for line in [
            "PLAY 0 color=purple",
            "PLAY 0 value=x",
            "PLAY 0 target=me",
            "PLAY 0 speed=3",
            "PLAY 0 red",
            "PLAY 0 color=red color=blue",
        ] {
            assert_eq!(parse(line).unwrap_err().kind(), ErrorKind::MalformedCommand, "{line}");
        }
    }

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!(parse("START").unwrap(), Command::Start);
        assert_eq!(parse("State").unwrap(), Command::State { game_id: None });
        assert_eq!(
            parse("STATE game-2").unwrap(),
            Command::State {
                game_id: Some("game-2".into())
            }
        );
        assert_eq!(parse("leave").unwrap(), Command::Leave);
        assert_eq!(parse("draw").unwrap(), Command::Draw);
        assert!(parse("START now").is_err());
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("").unwrap_err().kind(), ErrorKind::MalformedCommand);
        assert_eq!(parse("DANCE").unwrap_err(), GameError::MalformedCommand("unknown command 'DANCE'".into()));
    }

    #[test]
    fn test_mutation_flag() {
        assert!(!Command::State { game_id: None }.is_mutation());
        assert!(Command::Start.is_mutation());
    }
}
