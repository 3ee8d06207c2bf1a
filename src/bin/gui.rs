//! PDF Inverter GUI
//!
//! Pick a PDF, press the button, watch the status line.

use eframe::egui;
use pdf_invert::config::ShellConfig;
use pdf_invert::shell::Shell;
use std::time::Duration;

/// How often the window wakes up to collect worker events while busy.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 320.0])
            .with_title("PDF Inverter"),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Inverter",
        options,
        Box::new(|_cc| Ok(Box::new(InverterApp::new(ShellConfig::default())))),
    )
}

struct InverterApp {
    shell: Shell,
}

impl InverterApp {
    fn new(config: ShellConfig) -> Self {
        Self {
            shell: Shell::new(config),
        }
    }
}

impl eframe::App for InverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.shell.poll();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("PDF Inverter");
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Choose PDF...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("PDF", &["pdf", "PDF"])
                        .pick_file()
                    {
                        self.shell.select([path]);
                    }
                }

                match self.shell.selection().first() {
                    Some(path) => ui.label(path.display().to_string()),
                    None => ui.weak("No file chosen"),
                };
            });

            ui.label(format!(
                "Saving to {}",
                self.shell.config().output_dir.display()
            ));
            ui.separator();

            ui.label(self.shell.status());
            ui.add_space(8.0);

            let button = egui::Button::new("Process PDF");
            if ui.add_enabled(!self.shell.is_busy(), button).clicked() {
                self.shell.trigger();
            }
        });

        if self.shell.is_busy() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}
