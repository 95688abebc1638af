use crate::communication::Request;

pub fn parse_request(input: &str) -> Option<Request> {
    let parts: Vec<&str> = input.trim().split(':').collect();

    let request = match parts[0] {
        "connect" => {
            if parts.len() != 3 {
                return None;
            }

            Request::Connect {
                host: parts[1].to_string(),
                port: parts[2].parse().ok()?,
            }
        }
        "disconnect" => {
            if parts.len() != 1 {
                return None;
            }

            Request::Disconnect
        }
        "move_abs" | "move_rel" => {
            // "move_abs:axis:pulses:speed" with an optional trailing timing
            if parts.len() != 4 && parts.len() != 5 {
                return None;
            }

            let axis = parts[1].parse().ok()?;
            let pulses = parts[2].parse().ok()?;
            let speed = parts[3].parse().ok()?;
            let timing = if parts.len() == 5 {
                parts[4].parse().ok()?
            } else {
                0
            };

            if parts[0] == "move_abs" {
                Request::MoveAbsolute {
                    axis,
                    pulses,
                    speed,
                    timing,
                }
            } else {
                Request::MoveRelative {
                    axis,
                    pulses,
                    speed,
                    timing,
                }
            }
        }
        "move_mm" => {
            // "move_mm:axis:abs|rel:target:motor:speed"
            if parts.len() != 6 {
                return None;
            }

            let absolute = match parts[2] {
                "abs" => true,
                "rel" => false,
                _ => return None,
            };

            Request::MoveMm {
                axis: parts[1].parse().ok()?,
                absolute,
                target_mm: parts[3].parse().ok()?,
                motor: parts[4].to_string(),
                speed: parts[5].parse().ok()?,
            }
        }
        "origin" => {
            if parts.len() != 3 && parts.len() != 4 {
                return None;
            }

            Request::MoveOrigin {
                axis: parts[1].parse().ok()?,
                speed: parts[2].parse().ok()?,
                timing: if parts.len() == 4 {
                    parts[3].parse().ok()?
                } else {
                    0
                },
            }
        }
        "set_system" => {
            if parts.len() != 4 {
                return None;
            }

            Request::SetSystem {
                axis: parts[1].parse().ok()?,
                system_no: parts[2].parse().ok()?,
                value: parts[3].parse().ok()?,
            }
        }
        "monitor" => {
            if parts.len() < 2 {
                return None;
            }

            match parts[1] {
                "add" if parts.len() == 3 => Request::MonitorAdd {
                    axis: parts[2].parse().ok()?,
                },
                "remove" if parts.len() == 3 => Request::MonitorRemove {
                    axis: parts[2].parse().ok()?,
                },
                "start" if parts.len() == 2 => Request::MonitorStart { period_ms: None },
                "start" if parts.len() == 3 => Request::MonitorStart {
                    period_ms: Some(parts[2].parse().ok()?),
                },
                "stop" if parts.len() == 2 => Request::MonitorStop,
                _ => return None,
            }
        }
        "position" => {
            if parts.len() != 2 {
                return None;
            }

            Request::Position {
                axis: parts[1].parse().ok()?,
            }
        }
        _ => return None,
    };

    Some(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connect() {
        assert_eq!(
            parse_request("connect:192.168.1.120:12321"),
            Some(Request::Connect {
                host: "192.168.1.120".to_string(),
                port: 12321,
            })
        );
    }

    #[test]
    fn parses_moves_with_default_timing() {
        assert_eq!(
            parse_request("move_abs:1:4000:2"),
            Some(Request::MoveAbsolute {
                axis: 1,
                pulses: 4000,
                speed: 2,
                timing: 0,
            })
        );
        assert_eq!(
            parse_request("move_rel:2:-500:0:1"),
            Some(Request::MoveRelative {
                axis: 2,
                pulses: -500,
                speed: 0,
                timing: 1,
            })
        );
    }

    #[test]
    fn parses_move_mm() {
        assert_eq!(
            parse_request("move_mm:1:abs:1.5:KTM0650:2"),
            Some(Request::MoveMm {
                axis: 1,
                absolute: true,
                target_mm: 1.5,
                motor: "KTM0650".to_string(),
                speed: 2,
            })
        );
        assert!(parse_request("move_mm:1:sideways:1.5:KTM0650:2").is_none());
    }

    #[test]
    fn parses_monitor_subcommands() {
        assert_eq!(parse_request("monitor:add:3"), Some(Request::MonitorAdd { axis: 3 }));
        assert_eq!(
            parse_request("monitor:remove:3"),
            Some(Request::MonitorRemove { axis: 3 })
        );
        assert_eq!(
            parse_request("monitor:start:100"),
            Some(Request::MonitorStart {
                period_ms: Some(100)
            })
        );
        assert_eq!(
            parse_request("monitor:start"),
            Some(Request::MonitorStart { period_ms: None })
        );
        assert_eq!(parse_request("monitor:stop"), Some(Request::MonitorStop));
    }

    #[test]
    fn parses_origin_and_system() {
        assert_eq!(
            parse_request("origin:1:5"),
            Some(Request::MoveOrigin {
                axis: 1,
                speed: 5,
                timing: 0,
            })
        );
        assert_eq!(
            parse_request("set_system:1:2:8"),
            Some(Request::SetSystem {
                axis: 1,
                system_no: 2,
                value: 8,
            })
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_request("").is_none());
        assert!(parse_request("warp:1:9000").is_none());
        assert!(parse_request("move_abs:1:notanumber:2").is_none());
        assert!(parse_request("connect:only-a-host").is_none());
        assert!(parse_request("monitor:launch").is_none());
    }
}
