//! Playback timing: per-frame delays and the clock that drives an animation.

use std::sync::Arc;
use std::time::Duration;

use num_rational::Ratio;

use crate::composite::Compositor;
use crate::document::{Document, Repeat};
use crate::error::GifResult;
use crate::raster::Raster;

/// Declared delays below this are considered "zero" for playback purposes.
const DELAY_FLOOR_TRIGGER_MS: u64 = 10;
/// What a "zero" delay is played as. Matches the floor established viewers apply.
const DELAY_FLOOR_MS: u64 = 100;

/// The delay of a frame relative to the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd)]
pub struct Delay {
    ratio: Ratio<u32>,
}

impl Delay {
    /// Create a delay from a ratio of milliseconds.
    ///
    /// # Examples
    ///
    /// ```
    /// use gifplay::Delay;
    /// let delay_10ms = Delay::from_num_denom_ms(10, 1);
    /// ```
    pub fn from_num_denom_ms(numerator: u32, denominator: u32) -> Self {
        Delay {
            ratio: Ratio::new_raw(numerator, denominator),
        }
    }

    /// The numerator and denominator of the delay in milliseconds.
    pub fn num_denom_ms(self) -> (u32, u32) {
        (*self.ratio.numer(), *self.ratio.denom())
    }

    /// The delay truncated to whole milliseconds.
    pub fn as_millis(self) -> u32 {
        self.ratio.to_integer()
    }

    /// GIF streams declare delays in hundredths of a second.
    pub(crate) fn from_centis(centis: u16) -> Self {
        Delay::from_num_denom_ms(u32::from(centis) * 10, 1)
    }
}

impl From<Delay> for Duration {
    fn from(delay: Delay) -> Self {
        let ms = delay.ratio.to_integer();
        let rest = delay.ratio.numer() % delay.ratio.denom();
        let nanos = (u64::from(rest) * 1_000_000) / u64::from(*delay.ratio.denom());
        Duration::from_millis(ms.into()) + Duration::from_nanos(nanos)
    }
}

/// Boundary events produced while advancing the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A pass over the frame sequence completed.
    LoopEnd,
    /// The final pass of a finite repeat completed; playback has stopped.
    AnimationEnd,
}

/// Where the clock currently stands.
#[derive(Clone, Copy, Debug)]
pub struct PlaybackState {
    current_frame: usize,
    remainder_ms: u64,
    loops_completed: u32,
    playing: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState {
            current_frame: 0,
            remainder_ms: 0,
            loops_completed: 0,
            playing: true,
        }
    }
}

impl PlaybackState {
    /// The frame currently presented.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Completed passes over the frame sequence.
    pub fn loops_completed(&self) -> u32 {
        self.loops_completed
    }

    /// Whether the clock still advances. Becomes false only after the animation-end event.
    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// The animation clock.
///
/// Owns its compositing engine, its playback state and the output surface the current
/// frame is presented on. Many players may share one [`Document`]; each player must own
/// its own clock and cache.
pub struct Player {
    compositor: Compositor,
    state: PlaybackState,
    output: Raster,
    frame_skipping: bool,
}

impl Player {
    /// Creates a player over a shared document, presenting the first frame immediately.
    pub fn new(document: Arc<Document>) -> GifResult<Player> {
        let output = Raster::new(u32::from(document.width()), u32::from(document.height()))?;
        let mut player = Player {
            compositor: Compositor::new(document),
            state: PlaybackState::default(),
            output,
            frame_skipping: false,
        };
        player.present()?;
        Ok(player)
    }

    /// The document being played.
    pub fn document(&self) -> &Arc<Document> {
        self.compositor.document()
    }

    /// The compositing engine, e.g. to bound its cache or build it eagerly.
    pub fn compositor_mut(&mut self) -> &mut Compositor {
        &mut self.compositor
    }

    /// The surface the current frame is presented on.
    pub fn surface(&self) -> &Raster {
        &self.output
    }

    /// The current playback position.
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// When enabled, a large elapsed time jumps directly to the target frame instead of
    /// compositing every frame in between. Loop boundaries still produce their events.
    pub fn set_frame_skipping(&mut self, on: bool) {
        self.frame_skipping = on;
    }

    /// The delay the clock actually waits on frame `index`, in milliseconds.
    ///
    /// Declared delays below 10 ms are floored to 100 ms; files declaring zero delays
    /// otherwise degenerate into a busy loop.
    pub fn effective_delay(&self, index: usize) -> u64 {
        let declared = self
            .compositor
            .document()
            .frames()
            .get(index)
            .map_or(0, |f| u64::from(f.delay().as_millis()));
        if declared < DELAY_FLOOR_TRIGGER_MS {
            DELAY_FLOOR_MS
        } else {
            declared
        }
    }

    /// Advances playback by `elapsed` wall-clock time and repaints the output surface.
    ///
    /// Returns the boundary events crossed, in order. Without frame skipping, at most one
    /// full pass of frames is stepped per call, so a single call always terminates no
    /// matter how large `elapsed` is; leftover time stays in the accumulator.
    pub fn advance(&mut self, elapsed: Duration) -> GifResult<Vec<PlaybackEvent>> {
        let frame_count = self.compositor.document().frames().len();
        let mut events = Vec::new();
        if !self.state.playing || frame_count == 0 {
            return Ok(events);
        }
        self.state.remainder_ms = self
            .state
            .remainder_ms
            .saturating_add(elapsed.as_millis().try_into().unwrap_or(u64::MAX));
        if self.frame_skipping {
            self.advance_skipping(frame_count, &mut events);
        } else {
            self.advance_stepping(frame_count, &mut events);
        }
        self.present()?;
        Ok(events)
    }

    /// Jumps to `index` (clamped to the last frame) and repaints. Does not affect the
    /// playing flag or the loop counter.
    pub fn seek(&mut self, index: usize) -> GifResult<()> {
        let frame_count = self.compositor.document().frames().len();
        self.state.current_frame = index.min(frame_count.saturating_sub(1));
        self.state.remainder_ms = 0;
        self.present()
    }

    /// Rewinds to the first frame and clears the loop counter. `resume` decides whether
    /// the clock keeps running.
    pub fn reset(&mut self, resume: bool) -> GifResult<()> {
        self.state = PlaybackState {
            playing: resume,
            ..PlaybackState::default()
        };
        self.present()
    }

    fn advance_stepping(&mut self, frame_count: usize, events: &mut Vec<PlaybackEvent>) {
        let repeat = self.compositor.document().repeat();
        let mut steps = 0;
        while steps < frame_count {
            let delay = self.effective_delay(self.state.current_frame);
            if self.state.remainder_ms < delay {
                break;
            }
            self.state.remainder_ms -= delay;
            steps += 1;
            if self.cross_frame(frame_count, repeat, events) {
                return;
            }
        }
    }

    fn advance_skipping(&mut self, frame_count: usize, events: &mut Vec<PlaybackEvent>) {
        let repeat = self.compositor.document().repeat();
        loop {
            let rest_of_pass: u64 = (self.state.current_frame..frame_count)
                .map(|i| self.effective_delay(i))
                .sum();
            if self.state.remainder_ms < rest_of_pass {
                break;
            }
            self.state.remainder_ms -= rest_of_pass;
            self.state.current_frame = frame_count - 1;
            if self.cross_frame(frame_count, repeat, events) {
                return;
            }
        }
        // Inside the final pass: remainder no longer reaches the end of the sequence.
        while self.state.remainder_ms >= self.effective_delay(self.state.current_frame) {
            self.state.remainder_ms -= self.effective_delay(self.state.current_frame);
            self.state.current_frame += 1;
        }
    }

    /// Moves past the current frame, handling wraparound and termination. Returns true
    /// when playback stopped.
    fn cross_frame(
        &mut self,
        frame_count: usize,
        repeat: Repeat,
        events: &mut Vec<PlaybackEvent>,
    ) -> bool {
        if self.state.current_frame + 1 < frame_count {
            self.state.current_frame += 1;
            return false;
        }
        self.state.loops_completed += 1;
        events.push(PlaybackEvent::LoopEnd);
        if let Repeat::Finite(count) = repeat {
            if self.state.loops_completed >= u32::from(count) {
                events.push(PlaybackEvent::AnimationEnd);
                self.state.playing = false;
                self.state.current_frame = frame_count - 1;
                self.state.remainder_ms = 0;
                return true;
            }
        }
        self.state.current_frame = 0;
        false
    }

    fn present(&mut self) -> GifResult<()> {
        let raster = self.compositor.get_composited(self.state.current_frame)?;
        self.output.blit(raster, raster.bounds(), 0, 0, false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Delay, Duration};

    #[test]
    fn simple() {
        let second = Delay::from_num_denom_ms(1000, 1);
        assert_eq!(Duration::from(second), Duration::from_secs(1));
    }

    #[test]
    fn fps_30() {
        let thirtieth = Delay::from_num_denom_ms(1000, 30);
        let duration = Duration::from(thirtieth);
        assert_eq!(duration.as_secs(), 0);
        assert_eq!(duration.subsec_millis(), 33);
        assert_eq!(duration.subsec_nanos(), 33_333_333);
    }

    #[test]
    fn centiseconds_are_exact_milliseconds() {
        assert_eq!(Delay::from_centis(5).as_millis(), 50);
        assert_eq!(Delay::from_centis(0).as_millis(), 0);
    }
}
