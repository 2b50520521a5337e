//! DAPM widget graph.
//!
//! A component declares its widgets and a static route table of
//! `(sink, control, source)` triples. [`DapmGraph::validate`] checks that the
//! table only names declared widgets; [`DapmGraph::powered`] computes which
//! widgets sit on a complete path for the active streams:
//!
//! ```text
//! playback: AIF in  ──▶ … ──▶ Output endpoint
//! capture:  Input endpoint ──▶ … ──▶ AIF out
//! ```
//!
//! Supply widgets are powered when any widget they feed is powered.

use thiserror_no_std::Error;

use crate::pcm::{StreamDirection, StreamMask};

/// Most widgets a graph may hold.
pub const MAX_WIDGETS: usize = 64;

/// Route table problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DapmError {
    /// A route names a widget that was never declared.
    #[error("route references undeclared widget {0}")]
    UnknownWidget(&'static str),
    /// Two widgets share a name.
    #[error("widget {0} declared twice")]
    DuplicateWidget(&'static str),
    /// More than [`MAX_WIDGETS`] widgets.
    #[error("too many widgets")]
    TooManyWidgets,
}

/// Widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WidgetKind {
    /// Analogue input pin (endpoint).
    Input,
    /// Analogue output pin (endpoint).
    Output,
    /// Audio interface input, fed by the named playback stream.
    AifIn(StreamDirection),
    /// Audio interface output, feeding the named capture stream.
    AifOut(StreamDirection),
    /// Digital-to-analogue converter.
    Dac,
    /// Analogue-to-digital converter.
    Adc,
    /// Amplifier / gain stage.
    Pga,
    /// Supply (bias, clock, regulator).
    Supply,
}

/// Register bit that powers a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerControl {
    /// Register address.
    pub reg: u32,
    /// Bit position.
    pub shift: u8,
}

impl PowerControl {
    /// The bit as a byte mask.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // shift masked to 0..=7
    pub const fn mask(self) -> u8 {
        1 << (self.shift & 7)
    }
}

/// One DAPM widget (`struct snd_soc_dapm_widget`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Widget {
    /// Widget name, referenced by routes.
    pub name: &'static str,
    /// Kind.
    pub kind: WidgetKind,
    /// Power bit, `None` for widgets without a register.
    pub power: Option<PowerControl>,
}

impl Widget {
    /// `SND_SOC_DAPM_INPUT`
    #[must_use]
    pub const fn input(name: &'static str) -> Self {
        Self { name, kind: WidgetKind::Input, power: None }
    }

    /// `SND_SOC_DAPM_OUTPUT`
    #[must_use]
    pub const fn output(name: &'static str) -> Self {
        Self { name, kind: WidgetKind::Output, power: None }
    }

    /// `SND_SOC_DAPM_AIF_IN` bound to the playback stream.
    #[must_use]
    pub const fn aif_in(name: &'static str) -> Self {
        Self { name, kind: WidgetKind::AifIn(StreamDirection::Playback), power: None }
    }

    /// `SND_SOC_DAPM_AIF_OUT` bound to the capture stream.
    #[must_use]
    pub const fn aif_out(name: &'static str) -> Self {
        Self { name, kind: WidgetKind::AifOut(StreamDirection::Capture), power: None }
    }

    /// `SND_SOC_DAPM_DAC`
    #[must_use]
    pub const fn dac(name: &'static str, reg: u32, shift: u8) -> Self {
        Self { name, kind: WidgetKind::Dac, power: Some(PowerControl { reg, shift }) }
    }

    /// `SND_SOC_DAPM_ADC`
    #[must_use]
    pub const fn adc(name: &'static str, reg: u32, shift: u8) -> Self {
        Self { name, kind: WidgetKind::Adc, power: Some(PowerControl { reg, shift }) }
    }

    /// `SND_SOC_DAPM_PGA`
    #[must_use]
    pub const fn pga(name: &'static str, reg: u32, shift: u8) -> Self {
        Self { name, kind: WidgetKind::Pga, power: Some(PowerControl { reg, shift }) }
    }

    /// `SND_SOC_DAPM_SUPPLY`
    #[must_use]
    pub const fn supply(name: &'static str, reg: u32, shift: u8) -> Self {
        Self { name, kind: WidgetKind::Supply, power: Some(PowerControl { reg, shift }) }
    }
}

/// One route: audio flows from `source` to `sink`, optionally through a mixer control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Destination widget.
    pub sink: &'static str,
    /// Mixer/mux control name, `None` for a static connection.
    pub control: Option<&'static str>,
    /// Origin widget.
    pub source: &'static str,
}

impl Route {
    /// `{ sink, control, source }`
    #[must_use]
    pub const fn new(sink: &'static str, control: Option<&'static str>, source: &'static str) -> Self {
        Self { sink, control, source }
    }
}

/// Widgets selected out of a graph, one bit per widget index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WidgetSet(u64);

impl WidgetSet {
    fn bit(idx: usize) -> u64 {
        1u64.checked_shl(u32::try_from(idx).unwrap_or(u32::MAX)).unwrap_or(0)
    }

    fn insert(&mut self, idx: usize) {
        self.0 |= Self::bit(idx);
    }

    /// Whether widget `idx` is in the set.
    #[must_use]
    pub fn contains(self, idx: usize) -> bool {
        self.0 & Self::bit(idx) != 0
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A component's widgets and routes.
#[derive(Debug, Clone, Copy)]
pub struct DapmGraph<'a> {
    widgets: &'a [Widget],
    routes: &'a [Route],
}

impl<'a> DapmGraph<'a> {
    /// Wrap a widget list and route table.
    #[must_use]
    pub const fn new(widgets: &'a [Widget], routes: &'a [Route]) -> Self {
        Self { widgets, routes }
    }

    /// Declared widgets.
    #[must_use]
    pub fn widgets(&self) -> &'a [Widget] {
        self.widgets
    }

    /// Route table.
    #[must_use]
    pub fn routes(&self) -> &'a [Route] {
        self.routes
    }

    /// Index of a widget by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.widgets.iter().position(|w| w.name == name)
    }

    /// Check every route endpoint is a declared, uniquely named widget.
    pub fn validate(&self) -> Result<(), DapmError> {
        if self.widgets.len() > MAX_WIDGETS {
            return Err(DapmError::TooManyWidgets);
        }
        for (idx, widget) in self.widgets.iter().enumerate() {
            if self.find(widget.name) != Some(idx) {
                return Err(DapmError::DuplicateWidget(widget.name));
            }
        }
        for route in self.routes {
            for name in [route.sink, route.source] {
                if self.find(name).is_none() {
                    return Err(DapmError::UnknownWidget(name));
                }
            }
        }
        Ok(())
    }

    /// Widgets on a complete path for the active streams, plus the supplies feeding them.
    ///
    /// Assumes [`validate`][Self::validate] passed; unknown names are skipped.
    #[must_use]
    pub fn powered(&self, active: StreamMask) -> WidgetSet {
        let mut powered = WidgetSet::default();
        for (idx, widget) in self.widgets.iter().enumerate() {
            let from_aif = match widget.kind {
                WidgetKind::AifIn(dir) if active.contains(dir.into()) => true,
                WidgetKind::AifOut(dir) if active.contains(dir.into()) => false,
                _ => continue,
            };
            // Walk away from the interface, then back from the endpoints it
            // reached; only widgets on both walks lie on a complete path.
            let reached = self.reach(idx, from_aif);
            let endpoint = if from_aif { WidgetKind::Output } else { WidgetKind::Input };
            let mut back = WidgetSet::default();
            for (end, w) in self.widgets.iter().enumerate() {
                if w.kind == endpoint && reached.contains(end) {
                    back = back.union(self.reach(end, !from_aif));
                }
            }
            powered = powered.union(reached.intersect(back));
        }
        for route in self.routes {
            if let (Some(sink), Some(source)) = (self.find(route.sink), self.find(route.source)) {
                let is_supply = self
                    .widgets
                    .get(source)
                    .is_some_and(|w| w.kind == WidgetKind::Supply);
                if is_supply && powered.contains(sink) {
                    powered.insert(source);
                }
            }
        }
        powered
    }

    /// Iterate the widgets in `set`.
    pub fn iter_set(&self, set: WidgetSet) -> impl Iterator<Item = &'a Widget> {
        self.widgets
            .iter()
            .enumerate()
            .filter(move |(idx, _)| set.contains(*idx))
            .map(|(_, w)| w)
    }

    /// Widgets reachable from `start`, following routes source→sink when
    /// `forward`, sink→source otherwise. Supplies are not traversed.
    fn reach(&self, start: usize, forward: bool) -> WidgetSet {
        let mut seen = WidgetSet::default();
        let mut stack: heapless::Vec<usize, MAX_WIDGETS> = heapless::Vec::new();
        seen.insert(start);
        if stack.push(start).is_err() {
            return seen;
        }
        while let Some(cur) = stack.pop() {
            let Some(cur_name) = self.widgets.get(cur).map(|w| w.name) else {
                continue;
            };
            for route in self.routes {
                let (from, to) = if forward {
                    (route.source, route.sink)
                } else {
                    (route.sink, route.source)
                };
                if from != cur_name {
                    continue;
                }
                let Some(next) = self.find(to) else { continue };
                let supply = self
                    .widgets
                    .get(next)
                    .is_some_and(|w| w.kind == WidgetKind::Supply);
                if supply || seen.contains(next) {
                    continue;
                }
                seen.insert(next);
                if stack.push(next).is_err() {
                    break;
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGETS: [Widget; 6] = [
        Widget::aif_in("RX"),
        Widget::dac("DAC", 0x10, 0),
        Widget::output("OUT"),
        Widget::input("IN"),
        Widget::adc("ADC", 0x10, 1),
        Widget::aif_out("TX"),
    ];

    const ROUTES: [Route; 4] = [
        Route::new("DAC", None, "RX"),
        Route::new("OUT", None, "DAC"),
        Route::new("ADC", None, "IN"),
        Route::new("TX", None, "ADC"),
    ];

    fn names(graph: &DapmGraph<'_>, set: WidgetSet) -> std::vec::Vec<&'static str> {
        graph.iter_set(set).map(|w| w.name).collect()
    }

    #[test]
    fn valid_graph_passes() {
        assert_eq!(DapmGraph::new(&WIDGETS, &ROUTES).validate(), Ok(()));
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let routes = [Route::new("DAC", None, "Nowhere")];
        assert_eq!(
            DapmGraph::new(&WIDGETS, &routes).validate(),
            Err(DapmError::UnknownWidget("Nowhere"))
        );
    }

    #[test]
    fn duplicate_widget_is_rejected() {
        let widgets = [Widget::input("IN"), Widget::input("IN")];
        assert_eq!(
            DapmGraph::new(&widgets, &[]).validate(),
            Err(DapmError::DuplicateWidget("IN"))
        );
    }

    #[test]
    fn nothing_powered_without_streams() {
        let graph = DapmGraph::new(&WIDGETS, &ROUTES);
        assert!(graph.powered(StreamMask::empty()).is_empty());
    }

    #[test]
    fn playback_powers_only_playback_path() {
        let graph = DapmGraph::new(&WIDGETS, &ROUTES);
        let set = graph.powered(StreamMask::PLAYBACK);
        assert_eq!(names(&graph, set), ["RX", "DAC", "OUT"]);
    }

    #[test]
    fn capture_powers_only_capture_path() {
        let graph = DapmGraph::new(&WIDGETS, &ROUTES);
        let set = graph.powered(StreamMask::CAPTURE);
        assert_eq!(names(&graph, set), ["IN", "ADC", "TX"]);
    }

    #[test]
    fn incomplete_path_stays_off() {
        let routes = [Route::new("DAC", None, "RX")];
        let graph = DapmGraph::new(&WIDGETS, &routes);
        assert!(graph.powered(StreamMask::PLAYBACK).is_empty());
    }

    #[test]
    fn supply_follows_its_sink() {
        let widgets = [
            Widget::input("IN"),
            Widget::supply("BIAS", 0x10, 3),
            Widget::adc("ADC", 0x10, 1),
            Widget::aif_out("TX"),
        ];
        let routes = [
            Route::new("ADC", None, "IN"),
            Route::new("ADC", None, "BIAS"),
            Route::new("TX", None, "ADC"),
        ];
        let graph = DapmGraph::new(&widgets, &routes);
        let set = graph.powered(StreamMask::CAPTURE);
        assert_eq!(names(&graph, set), ["IN", "BIAS", "ADC", "TX"]);
        assert!(graph.powered(StreamMask::PLAYBACK).is_empty());
    }
}
