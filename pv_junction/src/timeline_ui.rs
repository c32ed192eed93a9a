//! Timeline side panel
//!
//! Narrated steps, playback controls and live readouts, drawn with egui.

use egui::{Color32, Context, RichText};
use pv_junction::field::FieldStrength;
use pv_junction::{PhaseNotice, Timeline};

/// Panel width in egui points
pub const PANEL_WIDTH: f32 = 300.0;

/// Something the user clicked that the host has to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    TogglePlay,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Active,
    Done,
}

/// How step `index` should be highlighted while `phase` is current
pub fn step_state(index: usize, phase: usize) -> StepState {
    match index.cmp(&phase) {
        std::cmp::Ordering::Less => StepState::Done,
        std::cmp::Ordering::Equal => StepState::Active,
        std::cmp::Ordering::Greater => StepState::Pending,
    }
}

/// Playback clock, with the narration length while steps remain ahead
pub fn clock_label(elapsed: f32, timeline: &Timeline) -> String {
    let total = timeline.final_time();
    if elapsed < total {
        format!("{:.1}s / {:.1}s", elapsed, total)
    } else {
        format!("{:.1}s", elapsed)
    }
}

/// A symbol on the canvas and what it stands for
pub struct LegendEntry {
    pub symbol: &'static str,
    pub color: Color32,
    pub meaning: &'static str,
}

pub const LEGEND: &[LegendEntry] = &[
    LegendEntry {
        symbol: "●",
        color: Color32::from_rgb(0xff, 0xc1, 0x07),
        meaning: "Photon from the sun",
    },
    LegendEntry {
        symbol: "●",
        color: Color32::from_rgb(0x1e, 0x88, 0xe5),
        meaning: "Free electron (e⁻)",
    },
    LegendEntry {
        symbol: "○",
        color: Color32::from_rgb(0xef, 0x53, 0x50),
        meaning: "Hole (h⁺)",
    },
    LegendEntry {
        symbol: "✺",
        color: Color32::from_rgb(0x00, 0xe6, 0xff),
        meaning: "Absorption flash",
    },
];

/// Everything the panel displays for one frame
pub struct PanelView<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub timeline: &'a Timeline,
    pub notice: PhaseNotice<'a>,
    pub field: &'a FieldStrength,
    pub loop_count: u64,
    pub elapsed: f32,
}

/// Draw the timeline panel; returns the control the user clicked, if any
pub fn draw_timeline_panel(ctx: &Context, view: &PanelView<'_>) -> Option<PanelAction> {
    let mut action = None;

    egui::SidePanel::right("timeline_panel")
        .resizable(false)
        .exact_width(PANEL_WIDTH)
        .show(ctx, |ui| {
            ui.heading(RichText::new(view.title).color(Color32::LIGHT_BLUE));
            ui.label(RichText::new(view.description).small().italics());
            ui.separator();

            ui.horizontal(|ui| {
                let play_label = if view.notice.playing { "⏸ Pause" } else { "▶ Play" };
                if ui.button(play_label).clicked() {
                    action = Some(PanelAction::TogglePlay);
                }
                if ui.button("⟲ Reset").clicked() {
                    action = Some(PanelAction::Reset);
                }
                ui.separator();
                ui.label(RichText::new(clock_label(view.elapsed, view.timeline)).monospace());
            });

            ui.add_space(6.0);
            ui.group(|ui| {
                ui.label(RichText::new(view.notice.label()).strong().color(Color32::YELLOW));
                ui.label(view.notice.info_text());
            });
            ui.add_space(6.0);

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.collapsing(RichText::new("🕑 Steps").strong(), |ui| {
                    for (index, step) in view.timeline.steps().iter().enumerate() {
                        let (marker, color) = match step_state(index, view.notice.index) {
                            StepState::Done => ("✔", Color32::LIGHT_GREEN),
                            StepState::Active => ("▶", Color32::YELLOW),
                            StepState::Pending => ("·", Color32::GRAY),
                        };
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(marker).color(color));
                            ui.label(RichText::new(format!("{:>4.1}s", step.time)).monospace());
                            ui.label(RichText::new(&step.label).color(color));
                        });
                    }
                });

                ui.add_space(8.0);

                ui.collapsing(RichText::new("⚡ Readouts").strong(), |ui| {
                    egui::Grid::new("readouts_grid")
                        .num_columns(2)
                        .spacing([10.0, 4.0])
                        .show(ui, |ui| {
                            ui.label("Field strength");
                            ui.add(
                                egui::ProgressBar::new(view.field.normalized())
                                    .text(format!("{:.0}%", view.field.current)),
                            );
                            ui.end_row();

                            ui.label("Active e⁻");
                            ui.label(RichText::new(view.field.active_electrons.to_string()).monospace());
                            ui.end_row();

                            ui.label("Completed loops");
                            ui.label(RichText::new(view.loop_count.to_string()).monospace());
                            ui.end_row();
                        });
                });

                ui.add_space(8.0);

                ui.collapsing(RichText::new("📖 Legend").strong(), |ui| {
                    for entry in LEGEND {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(entry.symbol).color(entry.color));
                            ui.label(entry.meaning);
                        });
                    }
                });

                ui.add_space(8.0);
                ui.label(RichText::new("Space: play/pause · R: reset · Esc: quit").small());
            });
        });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_before_the_phase_are_done() {
        assert_eq!(step_state(0, 2), StepState::Done);
        assert_eq!(step_state(2, 2), StepState::Active);
        assert_eq!(step_state(3, 2), StepState::Pending);
    }

    #[test]
    fn clock_shows_narration_length_until_the_last_step() {
        let timeline = Timeline::default();
        assert_eq!(clock_label(2.5, &timeline), "2.5s / 8.0s");
        assert_eq!(clock_label(9.0, &timeline), "9.0s");
        assert_eq!(clock_label(0.0, &Timeline::new(Vec::new()).expect("empty timeline")), "0.0s");
    }

    #[test]
    fn panel_runs_headless() {
        let ctx = Context::default();
        let timeline = Timeline::default();
        let field = FieldStrength::default();
        let view = PanelView {
            title: "PV Principle Demo",
            description: "",
            timeline: &timeline,
            notice: PhaseNotice {
                index: 1,
                step: timeline.get(1),
                playing: true,
            },
            field: &field,
            loop_count: 0,
            elapsed: 2.5,
        };

        let mut action = Some(PanelAction::Reset);
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            action = draw_timeline_panel(ctx, &view);
        });
        assert_eq!(action, None);
    }
}
