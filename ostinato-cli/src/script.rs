//! Command script parsing
//!
//! A script is a plain text file of timed control lines:
//!
//! ```text
//! # seconds  command  [args]
//! 0.0   record
//! 4.0   record
//! 4.5   overdub 0.6
//! 6.0   window 0.5
//! 8.0   jump 0.25
//! 10.0  speed -1
//! 14.0  stop
//! ```
//!
//! The same grammar minus the leading timestamp drives the live mode's
//! stdin. `speed` is handled by the host (it is a signal, not an engine
//! command); everything else maps onto an engine `Command`.

use anyhow::{anyhow, bail, Context, Result};
use ostinato_engine::{Command, InterpMode, LoopUnits, SwitchRampCurve};

/// One host-level action: an engine command or a speed change.
#[derive(Debug, Clone)]
pub enum Action {
    Engine(Command),
    Speed(f64),
}

/// A timed action within a render script.
#[derive(Debug, Clone)]
pub struct ScriptEvent {
    pub at_seconds: f64,
    pub action: Action,
}

/// Parse a whole script. Blank lines and `#` comments are skipped; events
/// come back sorted by time.
pub fn parse_script(text: &str) -> Result<Vec<ScriptEvent>> {
    let mut events = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(time_token) = tokens.next() else {
            continue;
        };
        let at_seconds: f64 = time_token
            .parse()
            .with_context(|| format!("line {}: bad timestamp '{}'", line_no + 1, time_token))?;
        if at_seconds < 0.0 {
            bail!("line {}: timestamp cannot be negative", line_no + 1);
        }
        let rest: Vec<&str> = tokens.collect();
        let action = parse_action(&rest)
            .with_context(|| format!("line {}: '{}'", line_no + 1, line))?;
        events.push(ScriptEvent { at_seconds, action });
    }
    events.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));
    Ok(events)
}

/// Parse one command line (no timestamp), as typed on stdin in live mode.
pub fn parse_action(tokens: &[&str]) -> Result<Action> {
    let &name = tokens.first().ok_or_else(|| anyhow!("missing command"))?;
    let args = &tokens[1..];

    let float_arg = |what: &str| -> Result<f64> {
        args.first()
            .ok_or_else(|| anyhow!("{} requires a value", what))?
            .parse::<f64>()
            .map_err(|_| anyhow!("{} requires a number, got '{}'", what, args[0]))
    };
    let int_arg = |what: &str| -> Result<i64> {
        args.first()
            .ok_or_else(|| anyhow!("{} requires a value", what))?
            .parse::<i64>()
            .map_err(|_| anyhow!("{} requires an integer, got '{}'", what, args[0]))
    };

    let action = match name {
        "play" => Action::Engine(Command::Play),
        "record" => Action::Engine(Command::Record),
        "stop" => Action::Engine(Command::Stop),
        "append" => Action::Engine(Command::Append),
        "resetloop" => Action::Engine(Command::ResetLoop),
        "jump" => Action::Engine(Command::Jump(float_arg("jump")?)),
        "overdub" => Action::Engine(Command::Overdub(float_arg("overdub")?)),
        "position" => Action::Engine(Command::Position(float_arg("position")?)),
        "window" => Action::Engine(Command::Window(float_arg("window")?)),
        "speed" => Action::Speed(float_arg("speed")?),
        "ramp" => Action::Engine(Command::Ramp(int_arg("ramp")?)),
        "snramp" => Action::Engine(Command::SnRamp(int_arg("snramp")?)),
        "snrcurv" => {
            Action::Engine(Command::SnrCurve(SwitchRampCurve::from_index(int_arg("snrcurv")? as u8)))
        }
        "interp" => Action::Engine(Command::Interp(parse_interp(args)?)),
        "report" => Action::Engine(Command::Report(int_arg("report")?)),
        "setloop" => Action::Engine(parse_setloop(args)?),
        other => bail!("unknown command '{}'", other),
    };
    Ok(action)
}

fn parse_interp(args: &[&str]) -> Result<InterpMode> {
    let &token = args.first().ok_or_else(|| anyhow!("interp requires a value"))?;
    Ok(match token {
        "linear" => InterpMode::Linear,
        "cubic" => InterpMode::Cubic,
        "spline" => InterpMode::Spline,
        _ => {
            let index: u8 = token
                .parse()
                .map_err(|_| anyhow!("interp takes linear/cubic/spline or 0..2"))?;
            InterpMode::from_index(index)
        }
    })
}

/// `setloop [low] [high] [units]` with the original's permissive argument
/// juggling: a single number is the high bound, `reset` restores the initial
/// loop, a trailing symbol picks the units.
fn parse_setloop(args: &[&str]) -> Result<Command> {
    if args.first() == Some(&"reset") {
        return Ok(Command::ResetLoop);
    }

    let mut numbers: Vec<f64> = Vec::new();
    let mut units = None;
    for &token in args {
        match token.parse::<f64>() {
            Ok(value) => {
                if numbers.len() == 2 {
                    bail!("setloop takes at most two bounds");
                }
                numbers.push(value);
            }
            Err(_) => {
                if units.is_some() {
                    bail!("setloop takes at most one unit token");
                }
                units = Some(LoopUnits::parse(token));
            }
        }
    }

    let (low, high) = match numbers.len() {
        0 => (None, None),
        1 => (None, Some(numbers[0])),
        _ => (Some(numbers[0]), Some(numbers[1])),
    };
    Ok(Command::SetLoop { low, high, units })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_script() {
        let script = "\
# capture then halve the window
0.0  record
2.0  record
3.0  window 0.5
";
        let events = parse_script(script).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0].action, Action::Engine(Command::Record)));
        assert!(matches!(events[2].action, Action::Engine(Command::Window(w)) if w == 0.5));
    }

    #[test]
    fn test_events_sorted_by_time() {
        let events = parse_script("5.0 stop\n1.0 play\n").unwrap();
        assert!(events[0].at_seconds < events[1].at_seconds);
        assert!(matches!(events[0].action, Action::Engine(Command::Play)));
    }

    #[test]
    fn test_speed_is_host_side() {
        let events = parse_script("0.5 speed -1.5\n").unwrap();
        assert!(matches!(events[0].action, Action::Speed(v) if v == -1.5));
    }

    #[test]
    fn test_setloop_single_number_is_high() {
        let action = parse_action(&["setloop", "500"]).unwrap();
        match action {
            Action::Engine(Command::SetLoop { low, high, units }) => {
                assert_eq!(low, None);
                assert_eq!(high, Some(500.0));
                assert_eq!(units, None);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_setloop_with_units() {
        let action = parse_action(&["setloop", "0.25", "0.75", "phase"]).unwrap();
        match action {
            Action::Engine(Command::SetLoop { low, high, units }) => {
                assert_eq!(low, Some(0.25));
                assert_eq!(high, Some(0.75));
                assert_eq!(units, Some(LoopUnits::Phase));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_setloop_reset() {
        let action = parse_action(&["setloop", "reset"]).unwrap();
        assert!(matches!(action, Action::Engine(Command::ResetLoop)));
    }

    #[test]
    fn test_bad_lines_are_errors() {
        assert!(parse_script("abc record\n").is_err());
        assert!(parse_script("1.0 frobnicate\n").is_err());
        assert!(parse_script("-1.0 play\n").is_err());
        assert!(parse_action(&["jump"]).is_err());
    }
}
