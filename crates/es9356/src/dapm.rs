//! DAPM widgets and routes.
//!
//! ```text
//! DP1RX ──▶ DAC ──▶ HP Amp ──▶ HP
//! MIC ─────▶ ADC ──▶ DP2TX
//! MIC Bias ─┘
//! ```

use platform::{DapmGraph, Route, StreamMask, Widget};

use crate::registers::{
    PWR_ADC_SHIFT, PWR_DAC_SHIFT, PWR_HP_SHIFT, PWR_MICBIAS_SHIFT, REG_PWR_CTL,
};

/// Widgets.
pub static WIDGETS: [Widget; 8] = [
    Widget::aif_in("DP1RX"),
    Widget::dac("DAC", REG_PWR_CTL, PWR_DAC_SHIFT),
    Widget::pga("HP Amp", REG_PWR_CTL, PWR_HP_SHIFT),
    Widget::output("HP"),
    Widget::input("MIC"),
    Widget::supply("MIC Bias", REG_PWR_CTL, PWR_MICBIAS_SHIFT),
    Widget::adc("ADC", REG_PWR_CTL, PWR_ADC_SHIFT),
    Widget::aif_out("DP2TX"),
];

/// Routes as `(sink, control, source)`.
pub static ROUTES: [Route; 6] = [
    Route::new("DAC", None, "DP1RX"),
    Route::new("HP Amp", None, "DAC"),
    Route::new("HP", None, "HP Amp"),
    Route::new("ADC", None, "MIC"),
    Route::new("ADC", None, "MIC Bias"),
    Route::new("DP2TX", None, "ADC"),
];

/// The codec's graph.
pub static GRAPH: DapmGraph<'static> = DapmGraph::new(&WIDGETS, &ROUTES);

/// `REG_PWR_CTL` value powering every widget on a complete path for `active`.
#[must_use]
pub fn power_ctl(active: StreamMask) -> u8 {
    GRAPH
        .iter_set(GRAPH.powered(active))
        .filter_map(|w| w.power)
        .filter(|p| p.reg == REG_PWR_CTL)
        .fold(0, |val, p| val | p.mask())
}
