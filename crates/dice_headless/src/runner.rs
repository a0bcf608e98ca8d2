//! Command loop: JSON lines in, JSON lines out.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use dice_core::math::Vec2Fixed;

use crate::protocol::{Command, Response};
use crate::session::Session;

/// Apply one command and build its response.
pub async fn handle_command(session: &Session, command: &Command) -> Response {
    let cmd = command.name();
    match command {
        Command::PurchaseDie { tier } => match session.purchase_die(*tier).await {
            Ok((die_id, currency)) => Response::DiePurchased {
                die_id,
                tier: *tier,
                currency,
            },
            Err(reason) => Response::rejected(cmd, reason),
        },
        Command::Roll { die_id, face } => match session.roll(*die_id, *face).await {
            Ok((outcome, currency)) => Response::Rolled {
                die_id: *die_id,
                face: outcome.face,
                reward: outcome.reward,
                critical: outcome.critical,
                currency,
            },
            Err(reason) => Response::rejected(cmd, reason),
        },
        Command::PurchaseSkill { skill_id } => match session.purchase_skill(skill_id).await {
            Ok((unlocked_tiers, currency)) => Response::SkillPurchased {
                skill_id: skill_id.clone(),
                unlocked_tiers,
                currency,
            },
            Err(reason) => Response::rejected(cmd, reason),
        },
        Command::PurchaseUpgrade { upgrade_id } => {
            match session.purchase_upgrade(upgrade_id).await {
                Ok((level, currency)) => Response::UpgradePurchased {
                    upgrade_id: upgrade_id.clone(),
                    level,
                    currency,
                },
                Err(reason) => Response::rejected(cmd, reason),
            }
        }
        Command::Move { die_id, x, y } => {
            if session.move_die(*die_id, Vec2Fixed::from_f64(*x, *y)).await {
                Response::ack(cmd)
            } else {
                Response::rejected(cmd, format!("Unknown die: {die_id}"))
            }
        }
        Command::Reset => {
            session.reset().await;
            Response::ack(cmd)
        }
        Command::Query => Response::State(Box::new(session.report().await)),
        Command::Hash => Response::StateHash {
            hash: session.state_hash().await,
        },
        Command::Quit => Response::Bye,
    }
}

/// Serve commands from `reader` until `quit` or end of input.
pub async fn run_lines<R, W>(session: &mut Session, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    session.sync_automation().await;
    let ready = Response::ready(session.currency().await);
    writer.write_all(ready.to_json_line().as_bytes()).await?;
    writer.flush().await?;

    let mut lines = reader.lines();
    let mut quit = false;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match Command::from_json(line) {
            Ok(command) => {
                debug!("Command: {}", command.name());
                quit = command == Command::Quit;
                let response = handle_command(session, &command).await;
                session.sync_automation().await;
                response
            }
            Err(e) => Response::error(format!("Invalid command: {e}"), None),
        };

        writer.write_all(response.to_json_line().as_bytes()).await?;
        writer.flush().await?;
        if quit {
            break;
        }
    }

    if !quit {
        writer.write_all(Response::Bye.to_json_line().as_bytes()).await?;
        writer.flush().await?;
    }
    session.shutdown();
    info!("Session ended");
    Ok(())
}

/// Serve commands from stdin to stdout.
pub async fn run_stdio(session: &mut Session) -> io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_lines(session, stdin, stdout).await
}
