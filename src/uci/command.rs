//! UCI command parsing.

/// A parsed inbound command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    NewGame,
    Position {
        /// `None` means the standard starting position.
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go(GoParams),
    SetOption {
        name: String,
        value: Option<String>,
    },
    Perft(usize),
    Display,
    Stop,
    Quit,
    Unknown(String),
}

/// Options of a `go` command. Times are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movetime: Option<u64>,
    pub depth: Option<u16>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

fn parse_value<T: std::str::FromStr>(parts: &[&str], index: usize) -> Option<T> {
    parts.get(index + 1).and_then(|v| v.parse().ok())
}

fn parse_go(parts: &[&str]) -> GoParams {
    let mut params = GoParams::default();
    let mut i = 1;
    while i < parts.len() {
        let consumed = match parts[i] {
            "wtime" => {
                params.wtime = parse_value(parts, i);
                2
            }
            "btime" => {
                params.btime = parse_value(parts, i);
                2
            }
            "winc" => {
                params.winc = parse_value(parts, i);
                2
            }
            "binc" => {
                params.binc = parse_value(parts, i);
                2
            }
            "movetime" => {
                params.movetime = parse_value(parts, i);
                2
            }
            "depth" => {
                params.depth = parse_value(parts, i);
                2
            }
            "nodes" => {
                params.nodes = parse_value(parts, i);
                2
            }
            "infinite" => {
                params.infinite = true;
                1
            }
            // Unknown option: skip the token and keep going.
            _ => 1,
        };
        i += consumed;
    }
    params
}

fn parse_position(parts: &[&str]) -> UciCommand {
    let mut fen = None;
    let mut moves = Vec::new();
    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "startpos" => i += 1,
            "fen" => {
                // A FEN is the next six whitespace-separated fields (or
                // fewer if "moves" arrives early).
                let start = i + 1;
                let end = parts[start..]
                    .iter()
                    .position(|&p| p == "moves")
                    .map_or(parts.len(), |offset| start + offset)
                    .min(start + 6);
                fen = Some(parts[start..end].join(" "));
                i = end;
            }
            "moves" => {
                moves = parts[i + 1..].iter().map(|&m| m.to_string()).collect();
                break;
            }
            _ => i += 1,
        }
    }
    UciCommand::Position { fen, moves }
}

fn parse_setoption(parts: &[&str]) -> UciCommand {
    // setoption name <name tokens> [value <value tokens>]
    enum Bucket {
        Skip,
        Name,
        Value,
    }
    let mut bucket = Bucket::Skip;
    let mut name: Vec<&str> = Vec::new();
    let mut value: Vec<&str> = Vec::new();
    for &part in &parts[1..] {
        match part {
            "name" => bucket = Bucket::Name,
            "value" => bucket = Bucket::Value,
            token => match bucket {
                Bucket::Name => name.push(token),
                Bucket::Value => value.push(token),
                Bucket::Skip => {}
            },
        }
    }
    UciCommand::SetOption {
        name: name.join(" "),
        value: if value.is_empty() {
            None
        } else {
            Some(value.join(" "))
        },
    }
}

/// Parse one protocol line. Blank lines yield `None`; unrecognised input
/// is preserved in `Unknown` so the caller can report it.
#[must_use]
pub fn parse(line: &str) -> Option<UciCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let first = *parts.first()?;

    let command = match first {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::NewGame,
        "position" => parse_position(&parts),
        "go" => UciCommand::Go(parse_go(&parts)),
        "setoption" => parse_setoption(&parts),
        "perft" => UciCommand::Perft(parse_value(&parts, 0).unwrap_or(1)),
        "d" | "display" => UciCommand::Display,
        "stop" => UciCommand::Stop,
        "quit" => UciCommand::Quit,
        _ => UciCommand::Unknown(line.trim().to_string()),
    };
    Some(command)
}
