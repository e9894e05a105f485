//! Proximity state machine
//!
//! Converts per-frame zone hits into debounced alerts with a four-state life
//! cycle:
//!
//! ```text
//! IDLE --near--> DETECTING --held for trigger_time--> ALERT --next update--> COOLDOWN
//!  ^                 |                                                        |
//!  +-----not near----+                                                        |
//!  +-------------------------------cooldown_time elapsed----------------------+
//! ```
//!
//! After an alert the hand must be withdrawn at least once (one not-near
//! frame) before a new detection cycle can start. All timing compares
//! timestamps captured from the injected [`Clock`] at call time; nothing runs
//! in the background.

use crate::clock::{Clock, SystemClock};
use crate::detection::types::{
    AlertEvent, DetectionState, DetectionZone, FaceLandmarks, HandKeypoints, HeadRegion,
    ProximityInfo,
};
use crate::detection::zones;
use serde::{Deserialize, Serialize};

/// Default seconds a hand must stay near before an alert
pub const DEFAULT_TRIGGER_TIME_SECS: f64 = 1.0;

/// Default seconds after an alert before detection re-arms
pub const DEFAULT_COOLDOWN_TIME_SECS: f64 = 2.0;

/// Default detection sensitivity
pub const DEFAULT_SENSITIVITY: f64 = 0.5;

/// Proximity state machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProximityConfig {
    /// Seconds a hand must stay near before an alert fires
    pub trigger_time: f64,
    /// Seconds after an alert before detection re-arms
    pub cooldown_time: f64,
    /// 0 (tight radius) to 1 (wide radius)
    pub sensitivity: f64,
    pub enabled_zones: Vec<DetectionZone>,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            trigger_time: DEFAULT_TRIGGER_TIME_SECS,
            cooldown_time: DEFAULT_COOLDOWN_TIME_SECS,
            sensitivity: DEFAULT_SENSITIVITY,
            enabled_zones: vec![DetectionZone::FullFace],
        }
    }
}

impl ProximityConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(json)?;
        config.sensitivity = config.sensitivity.clamp(0.0, 1.0);
        Ok(config)
    }

    /// Apply a partial update
    pub fn apply(&mut self, update: ProximityConfigUpdate) {
        if let Some(trigger_time) = update.trigger_time {
            self.trigger_time = trigger_time;
        }
        if let Some(cooldown_time) = update.cooldown_time {
            self.cooldown_time = cooldown_time;
        }
        if let Some(sensitivity) = update.sensitivity {
            self.sensitivity = sensitivity.clamp(0.0, 1.0);
        }
        if let Some(enabled_zones) = update.enabled_zones {
            self.enabled_zones = enabled_zones;
        }
    }
}

/// Partial configuration update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityConfigUpdate {
    pub trigger_time: Option<f64>,
    pub cooldown_time: Option<f64>,
    pub sensitivity: Option<f64>,
    pub enabled_zones: Option<Vec<DetectionZone>>,
}

type AlertHandler = Box<dyn FnMut(&AlertEvent)>;
type StateHandler = Box<dyn FnMut(DetectionState)>;
type ProximityHandler = Box<dyn FnMut(&ProximityInfo)>;

/// Observer callbacks, at most one per kind, invoked synchronously
#[derive(Default)]
pub struct ProximityHandlers {
    on_alert: Option<AlertHandler>,
    on_state_change: Option<StateHandler>,
    on_proximity: Option<ProximityHandler>,
}

impl ProximityHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called exactly once per alert
    pub fn on_alert(mut self, handler: impl FnMut(&AlertEvent) + 'static) -> Self {
        self.on_alert = Some(Box::new(handler));
        self
    }

    /// Called on every actual state transition, and by `reset`
    pub fn on_state_change(mut self, handler: impl FnMut(DetectionState) + 'static) -> Self {
        self.on_state_change = Some(Box::new(handler));
        self
    }

    /// Called on every `update`
    pub fn on_proximity(mut self, handler: impl FnMut(&ProximityInfo) + 'static) -> Self {
        self.on_proximity = Some(Box::new(handler));
        self
    }
}

impl std::fmt::Debug for ProximityHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximityHandlers")
            .field("on_alert", &self.on_alert.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .field("on_proximity", &self.on_proximity.is_some())
            .finish()
    }
}

/// Debounced hand-near-head detector
pub struct ProximityMachine<C: Clock = SystemClock> {
    config: ProximityConfig,
    clock: C,
    handlers: ProximityHandlers,
    state: DetectionState,
    detect_start_ms: Option<i64>,
    cooldown_start_ms: Option<i64>,
    require_hand_removal: bool,
    is_near_head: bool,
    active_zone: Option<DetectionZone>,
}

impl ProximityMachine<SystemClock> {
    /// Machine driven by the system clock
    pub fn with_system_clock(config: ProximityConfig, handlers: ProximityHandlers) -> Self {
        Self::new(config, SystemClock, handlers)
    }
}

impl<C: Clock> ProximityMachine<C> {
    pub fn new(mut config: ProximityConfig, clock: C, handlers: ProximityHandlers) -> Self {
        config.sensitivity = config.sensitivity.clamp(0.0, 1.0);
        Self {
            config,
            clock,
            handlers,
            state: DetectionState::Idle,
            detect_start_ms: None,
            cooldown_start_ms: None,
            require_hand_removal: false,
            is_near_head: false,
            active_zone: None,
        }
    }

    /// Advance the machine with one frame of geometry
    pub fn update(
        &mut self,
        hands: &[HandKeypoints],
        head: Option<&HeadRegion>,
        face: Option<&FaceLandmarks>,
    ) -> ProximityInfo {
        let now = self.clock.now_ms();
        let hit = zones::evaluate(
            hands,
            head,
            face,
            &self.config.enabled_zones,
            self.config.sensitivity,
        );
        let near = hit.is_near_head;
        self.is_near_head = near;
        self.active_zone = hit.active_zone;

        let mut progress = 0.0;

        match self.state {
            DetectionState::Idle => {
                if near && !self.require_hand_removal {
                    self.transition(DetectionState::Detecting);
                    self.detect_start_ms = Some(now);
                }
            }

            DetectionState::Detecting => {
                if !near {
                    self.transition(DetectionState::Idle);
                    self.detect_start_ms = None;
                } else {
                    let start = *self.detect_start_ms.get_or_insert(now);
                    progress = fraction(now - start, self.config.trigger_time);
                    if progress >= 1.0 {
                        self.transition(DetectionState::Alert);
                        self.cooldown_start_ms = Some(now);
                        self.fire_alert(AlertEvent {
                            timestamp: now,
                            contact_duration_ms: (now - start).max(0) as u64,
                            zone: hit.active_zone,
                        });
                    }
                }
            }

            DetectionState::Alert => {
                self.require_hand_removal = true;
                self.transition(DetectionState::Cooldown);
                let start = *self.cooldown_start_ms.get_or_insert(now);
                progress = 1.0 - fraction(now - start, self.config.cooldown_time);
            }

            DetectionState::Cooldown => {
                let start = *self.cooldown_start_ms.get_or_insert(now);
                let elapsed = fraction(now - start, self.config.cooldown_time);
                if elapsed >= 1.0 {
                    self.transition(DetectionState::Idle);
                    self.cooldown_start_ms = None;
                    self.detect_start_ms = None;
                } else {
                    progress = 1.0 - elapsed;
                }
            }
        }

        if !near {
            self.require_hand_removal = false;
        }

        let info = ProximityInfo {
            is_near_head: near,
            progress,
            state: self.state,
            active_zone: hit.active_zone,
        };
        if let Some(handler) = self.handlers.on_proximity.as_mut() {
            handler(&info);
        }
        info
    }

    /// Force IDLE and clear timers and the hand-removal latch
    pub fn reset(&mut self) {
        self.state = DetectionState::Idle;
        self.detect_start_ms = None;
        self.cooldown_start_ms = None;
        self.require_hand_removal = false;
        self.is_near_head = false;
        self.active_zone = None;
        if let Some(handler) = self.handlers.on_state_change.as_mut() {
            handler(DetectionState::Idle);
        }
    }

    /// Merge a partial configuration update
    pub fn update_config(&mut self, update: ProximityConfigUpdate) {
        self.config.apply(update);
        log::debug!("proximity config updated: {:?}", self.config);
    }

    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    /// Whether the latest update saw a hand near the head
    pub fn is_hand_near_head(&self) -> bool {
        self.is_near_head
    }

    /// Zone reported by the latest update
    pub fn active_zone(&self) -> Option<DetectionZone> {
        self.active_zone
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn transition(&mut self, next: DetectionState) {
        if self.state == next {
            return;
        }
        log::debug!("proximity state {:?} -> {:?}", self.state, next);
        self.state = next;
        if let Some(handler) = self.handlers.on_state_change.as_mut() {
            handler(next);
        }
    }

    fn fire_alert(&mut self, event: AlertEvent) {
        log::info!(
            "touch alert after {} ms (zone: {})",
            event.contact_duration_ms,
            event.zone.map(|z| z.as_str()).unwrap_or("none")
        );
        if let Some(handler) = self.handlers.on_alert.as_mut() {
            handler(&event);
        }
    }
}

/// Elapsed fraction of a window, clamped to [0, 1].
///
/// A non-positive window is already complete.
fn fraction(elapsed_ms: i64, window_secs: f64) -> f64 {
    if window_secs <= 0.0 || window_secs.is_nan() {
        return 1.0;
    }
    let elapsed_secs = elapsed_ms.max(0) as f64 / 1000.0;
    (elapsed_secs / window_secs).min(1.0)
}
