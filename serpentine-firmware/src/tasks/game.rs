//! Game task
//!
//! Drives the tick loop. The loop itself decides when a frame is due; the
//! task only wakes it often enough to keep the frame interval accurate.

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::{Duration, Instant, Ticker};

use serpentine_core::traits::Clock;
use serpentine_core::{DeathCause, Poll, TickLoop};
use serpentine_drivers::{AnalogJoystick, St7735};

use crate::input::AdcAxes;
use crate::link::UartLink;

/// Poll period; well under one frame
const POLL_INTERVAL_MS: u64 = 2;

/// Frames between diagnostics dumps
const DIAGNOSTICS_EVERY: u32 = 300;

/// Milliseconds since the task started
pub struct Uptime(Instant);

impl Uptime {
    pub fn start() -> Self {
        Self(Instant::now())
    }
}

impl Clock for Uptime {
    fn now_ms(&self) -> u32 {
        self.0.elapsed().as_millis() as u32
    }
}

pub type Display = St7735<Spi<'static, SPI0, Blocking>, Output<'static>, Output<'static>>;
pub type Stick = AnalogJoystick<AdcAxes, Input<'static>>;
pub type Game = TickLoop<Uptime, Stick, Display, UartLink>;

/// Game task - connects to the peer and runs the match
#[embassy_executor::task]
pub async fn game_task(mut game: Game) {
    info!("Game task started, local snake {}", game.local_snake().value());

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let mut link_state = None;

    loop {
        match game.poll() {
            Ok(Poll::Connecting(state)) => {
                if link_state != Some(state) {
                    info!("Handshake: {:?}", state);
                    link_state = Some(state);
                }
            }
            Ok(Poll::Idle) => {
                if link_state.is_some_and(|s| !s.is_connected()) {
                    info!("Peer connected, match starting");
                    link_state = Some(game.peer().state());
                }
            }
            Ok(Poll::Ticked(report)) => {
                for death in &report.deaths {
                    let id = death.snake.value();
                    match death.cause {
                        DeathCause::Collision(hit) => {
                            info!("Snake {} died at tick {}: {:?}", id, report.tick, hit)
                        }
                        DeathCause::Boundary => {
                            info!("Snake {} left the board at tick {}", id, report.tick)
                        }
                        DeathCause::Capacity => {
                            warn!("Snake {} ran out of segments at tick {}", id, report.tick)
                        }
                    }
                }
                if report.tick % DIAGNOSTICS_EVERY == 0 {
                    debug!("Diagnostics: {:?}", game.diagnostics());
                }
            }
            Ok(Poll::Over) => {
                info!("All snakes are dead after {} ticks", game.game().ticks());
                info!("Diagnostics: {:?}", game.diagnostics());
                break;
            }
            Err(e) => {
                error!("Game loop error: {:?}", e);
            }
        }

        ticker.next().await;
    }
}
