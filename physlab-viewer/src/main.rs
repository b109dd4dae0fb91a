//! physlab viewer - interactive window for the scene catalog
//!
//! Pick a scene, drag its sliders and watch it rebuild. Geometry sliders
//! pause the scene after rebuilding; press Play to continue. Pendulums,
//! bouncing balls and the spring can be grabbed and thrown with the mouse.

mod draw;

use eframe::egui;
use physlab::scenes::CATALOG;
use physlab::{render_control_panel, ClockState, ParamPreset, SceneController};
use std::time::Instant;

// ============================================================================
// Native entry point
// ============================================================================

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 720.0])
            .with_title("physlab"),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    eframe::run_native(
        "physlab",
        options,
        Box::new(|_cc| Ok(Box::new(ViewerApp::new()))),
    )
}

struct ViewerApp {
    /// Index into `CATALOG`
    selected: usize,
    controller: Option<SceneController>,
    current_file: Option<String>,
    status_message: Option<(String, Instant)>,
    time_scale: f32,
    /// Keep the first scene body horizontally centred
    follow: bool,
}

impl ViewerApp {
    fn new() -> Self {
        let mut app = Self {
            selected: 0,
            controller: None,
            current_file: None,
            status_message: None,
            time_scale: 1.0,
            follow: false,
        };
        app.load_scene(0);
        app
    }

    fn show_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    fn load_scene(&mut self, index: usize) {
        let Some(entry) = CATALOG.get(index) else {
            return;
        };
        self.selected = index;
        match SceneController::new((entry.scene)()) {
            Ok(mut controller) => {
                controller.set_time_scale(self.time_scale);
                if let Err(e) = controller.reset() {
                    self.show_status(format!("{}: {}", entry.name, e));
                } else {
                    self.show_status(format!("Loaded {}", entry.name));
                }
                self.follow = entry.follow;
                self.controller = Some(controller);
            }
            Err(e) => {
                self.controller = None;
                self.show_status(format!("Invalid scene {}: {}", entry.name, e));
            }
        }
    }

    // ========================================================================
    // Preset files (using rfd)
    // ========================================================================

    fn save_preset(&mut self) {
        let Some(controller) = &self.controller else {
            return;
        };
        let preset = controller.preset();
        let file_name = format!("{}.json", CATALOG[self.selected].slug());
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name(file_name)
            .save_file()
        {
            let path_str = path.display().to_string();
            match preset.save(&path) {
                Ok(()) => {
                    self.show_status(format!("Saved to {}", path_str));
                    self.current_file = Some(path_str);
                }
                Err(e) => self.show_status(format!("Save failed: {}", e)),
            }
        }
    }

    fn load_preset(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            return;
        };
        let path_str = path.display().to_string();
        let preset = match ParamPreset::load(&path) {
            Ok(p) => p,
            Err(e) => {
                self.show_status(format!("Load failed: {}", e));
                return;
            }
        };

        // Switch to the preset's scene first
        let index = CATALOG.iter().position(|e| e.name == preset.scene);
        match index {
            Some(i) if i != self.selected => self.load_scene(i),
            Some(_) => {}
            None => {
                self.show_status(format!("Unknown scene '{}' in {}", preset.scene, path_str));
                return;
            }
        }

        let result = match self.controller.as_mut() {
            Some(controller) => controller.apply_preset(&preset),
            None => return,
        };
        match result {
            Ok(()) => {
                self.show_status(format!("Loaded {}", path_str));
                self.current_file = Some(path_str);
            }
            Err(e) => self.show_status(format!("Load failed: {}", e)),
        }
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Scene");
        let mut selected = self.selected;
        egui::ComboBox::from_id_salt("scene")
            .width(ui.available_width())
            .selected_text(CATALOG[selected].name)
            .show_index(ui, &mut selected, CATALOG.len(), |i| CATALOG[i].name);
        if selected != self.selected {
            self.load_scene(selected);
        }
        ui.label(egui::RichText::new(CATALOG[self.selected].description).small().weak());

        ui.separator();

        let Some(controller) = self.controller.as_mut() else {
            ui.label("No scene loaded");
            return;
        };

        ui.horizontal(|ui| {
            let btn_text = match controller.state() {
                ClockState::Running => "⏸ Pause",
                ClockState::Stopped => "▶ Play",
            };
            if ui.button(btn_text).clicked() {
                controller.toggle();
            }
            if ui.button("Reset").on_hover_text("Rebuild from the current values and run").clicked() {
                let _ = controller.reset();
            }
        });
        let mut restored = None;
        if ui
            .button("Defaults")
            .on_hover_text("Put every parameter back to its default and run")
            .clicked()
        {
            restored = Some(match controller.restore_defaults() {
                Ok(()) => "Parameters restored to defaults".to_string(),
                Err(e) => format!("Defaults failed: {}", e),
            });
        }
        let draggable = controller.scene().is_draggable();

        if ui
            .add(egui::Slider::new(&mut self.time_scale, 0.1..=3.0).text("Time scale"))
            .changed()
        {
            controller.set_time_scale(self.time_scale);
        }
        ui.checkbox(&mut self.follow, "Follow body");
        if draggable {
            ui.label(egui::RichText::new("Drag bodies with the mouse").small().weak());
        }

        ui.separator();
        ui.heading("Parameters");
        let changes = render_control_panel(ui, controller.panel_mut());
        let mut failure = None;
        for change in &changes {
            if let Err(e) = controller.apply_change(change) {
                failure = Some(format!("{}: {}", change.name, e));
            }
        }

        let readings: Vec<String> = controller
            .telemetry()
            .readings()
            .iter()
            .map(|r| r.to_string())
            .collect();
        if !readings.is_empty() {
            ui.separator();
            ui.heading("Readout");
            for reading in readings {
                ui.monospace(reading);
            }
        }

        if let Some(msg) = restored {
            self.show_status(msg);
        }
        if let Some(msg) = failure {
            self.show_status(msg);
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let delta_time = ctx.input(|i| i.stable_dt);
        if let Some(controller) = self.controller.as_mut() {
            controller.advance(delta_time);
            if controller.is_running() {
                ctx.request_repaint();
            }
        }

        // Menu bar
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Preset...").clicked() {
                        self.load_preset();
                        ui.close_menu();
                    }
                    if ui.button("Save Preset...").clicked() {
                        self.save_preset();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Scenes", |ui| {
                    for (i, entry) in CATALOG.iter().enumerate() {
                        if ui.button(entry.name).on_hover_text(entry.description).clicked() {
                            self.load_scene(i);
                            ui.close_menu();
                        }
                    }
                });
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                // Status message with timeout
                if let Some((msg, time)) = &self.status_message {
                    if time.elapsed().as_secs() < 5 {
                        ui.label(msg);
                    } else {
                        self.status_message = None;
                    }
                }

                if let Some(error) = self.controller.as_ref().and_then(|c| c.last_error()) {
                    ui.separator();
                    ui.label(egui::RichText::new(error.to_string()).color(egui::Color32::LIGHT_RED));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("{:.0} FPS", 1.0 / ctx.input(|i| i.stable_dt)));
                    ui.separator();

                    if let Some(controller) = &self.controller {
                        ui.label(format!(
                            "t = {:.2}s ({} ticks)",
                            controller.clock().elapsed_secs(),
                            controller.clock().ticks()
                        ));
                        ui.separator();
                    }

                    if let Some(file) = &self.current_file {
                        ui.label(egui::RichText::new(file).small().weak());
                    } else {
                        ui.label(egui::RichText::new("(unsaved)").small().weak());
                    }
                });
            });
        });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.side_panel(ui));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(draw::BACKGROUND))
            .show(ctx, |ui| match self.controller.as_mut() {
                Some(controller) => draw::paint_scene(ui, controller, self.follow),
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.label("Select a scene");
                    });
                }
            });
    }
}
