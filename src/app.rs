// Copyright (C) 2025 Joshua Kesler
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::{path::{Path, PathBuf}, time::Duration};

use crate::dialog::{self, DialogError};
use crate::embed;
use crate::messages::{dialog::{DialogCommand, DialogMessage, FileKind}, thumbnail::{ThumbnailCommand, ThumbnailStatus}, video::{VideoCommand, VideoMessage}};
use crate::session::{Session, SubmissionStatus};
use crate::state::SourceMode;
use crate::video;
use crossbeam_channel::{Receiver, Sender};
use eframe::{egui, App, Frame};
use chrono::{DateTime, Local};
use tracing::{error, warn};

/// Channel ends for the dialog, video and thumbnail worker threads.
pub struct Workers {
    pub dialog_tx: Sender<DialogCommand>,
    pub dialog_rx: Receiver<DialogMessage>,
    pub video_tx: Sender<VideoCommand>,
    pub video_rx: Receiver<VideoMessage>,
    pub thumb_tx: Sender<ThumbnailCommand>,
    pub thumb_rx: Receiver<ThumbnailStatus>
}

pub struct ThumbsetApp {
    workers: Workers,
    session: Session,
    frame_texture: Option<egui::TextureHandle>,
    capture_uri: Option<String>,
    captures: u32,
    seek_position: f64,
    finished_at: Option<DateTime<Local>>
}

impl ThumbsetApp {
    pub fn new(cc: &eframe::CreationContext, workers: Workers, initial_video: Option<PathBuf>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        let mut app = Self {
            workers,
            session: Session::new(),
            frame_texture: None,
            capture_uri: None,
            captures: 0,
            seek_position: 0.0,
            finished_at: None
        };

        if let Some(path) = initial_video {
            match dialog::validate_selection(FileKind::Video, path) {
                Ok(path) => {
                    let cmd = app.session.choose_video(path);
                    app.send_video(cmd);
                },
                Err(e) => {
                    warn!(error = %e, "ignoring startup video");
                    app.session.finish_dialog(FileKind::Video, Err(e));
                }
            }
        }
        app
    }

    fn send_video(&mut self, cmd: VideoCommand) {
        if self.workers.video_tx.send(cmd).is_err() {
            error!("video worker is gone");
        }
    }

    fn open_dialog(&mut self, kind: FileKind) {
        if !self.session.begin_dialog(kind) {
            return;
        }

        if self.workers.dialog_tx.send(DialogCommand::Open(kind)).is_err() {
            error!("dialog worker is gone");
            self.session.finish_dialog(kind, Err(DialogError::Unavailable(String::from("dialog worker stopped"))));
        }
    }

    fn submit(&mut self) {
        let Some(request) = self.session.begin_submit() else { return };
        if self.workers.thumb_tx.send(ThumbnailCommand::Submit(request)).is_err() {
            error!("thumbnail worker is gone");
            self.session.finish_submit(Err(String::from("Thumbnail worker stopped")));
        }
    }

    fn forget_capture(&mut self, ctx: &egui::Context) {
        if let Some(uri) = self.capture_uri.take() {
            ctx.forget_image(&uri);
        }
    }

    fn capture(&mut self, ctx: &egui::Context) {
        if self.session.capture_frame().is_ok() {
            self.forget_capture(ctx);
            self.captures += 1;
            self.capture_uri = Some(format!("bytes://capture-{}.png", self.captures));
        }
    }

    fn poll_workers(&mut self, ctx: &egui::Context) {
        while let Ok(DialogMessage::Closed { kind, result }) = self.workers.dialog_rx.try_recv() {
            if let Some(cmd) = self.session.finish_dialog(kind, result) {
                self.frame_texture = None;
                self.seek_position = 0.0;
                self.forget_capture(ctx);
                self.send_video(cmd);
            }
        }

        while let Ok(msg) = self.workers.video_rx.try_recv() {
            if self.session.apply_video_message(msg) {
                if let Some(frame) = self.session.video().frame() {
                    let size = [frame.image.width() as usize, frame.image.height() as usize];
                    let img = egui::ColorImage::from_rgba_unmultiplied(size, frame.image.as_raw());
                    self.frame_texture = Some(ctx.load_texture("video-frame", img, Default::default()));
                }
            }
        }

        while let Ok(ThumbnailStatus::Finished(result)) = self.workers.thumb_rx.try_recv() {
            self.session.finish_submit(result);
            self.finished_at = Some(Local::now());
        }
    }
}

impl App for ThumbsetApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_workers(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Video Thumbnail Setter");
            ui.separator();
            self.show_paths(ui);
            ui.separator();
            self.show_preview(ui, ctx);
            ui.separator();
            self.show_source(ui);
            ui.separator();
            self.show_submit(ui);
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

fn path_field(ui: &mut egui::Ui, path: Option<&Path>, hint: &str) {
    let mut text = path.map(|p| p.display().to_string()).unwrap_or_default();
    ui.add(egui::TextEdit::singleline(&mut text).hint_text(hint).interactive(false).desired_width(480.0));
}

impl ThumbsetApp {
    fn show_paths(&mut self, ui: &mut egui::Ui) {
        let can_browse = !self.session.is_busy();
        let mut browse = None;
        egui::Grid::new("paths_grid").num_columns(3).show(ui, |ui| {
            ui.label("Video file:");
            path_field(ui, self.session.state().video_path(), "Select a video file...");
            if ui.add_enabled(can_browse, egui::Button::new("Browse")).clicked() {
                browse = Some(FileKind::Video);
            }
            ui.end_row();

            ui.label("Thumbnail image:");
            path_field(ui, self.session.state().image_path(), "Select an image file...");
            if ui.add_enabled(can_browse, egui::Button::new("Browse")).clicked() {
                browse = Some(FileKind::Image);
            }
            ui.end_row();
        });

        if let Some(kind) = browse {
            self.open_dialog(kind);
        }
    }

    fn show_preview(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let loaded = self.session.video().is_loaded();
        let duration = self.session.video().duration();

        if let Some(texture) = &self.frame_texture {
            let size = texture.size_vec2();
            let aspect = size.x / size.y;
            let available_w = ui.available_width();
            let available_h = 300.0;
            let (w, h) = if available_w / aspect <= available_h {
                (available_w, available_w / aspect)
            } else {
                (available_h * aspect, available_h)
            };

            ui.vertical_centered(|ui| {
                ui.add(egui::Image::new(texture).fit_to_exact_size(egui::vec2(w, h)));
            });
        } else if self.session.video().path().is_some() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading video...");
            });
        } else {
            ui.label("No video selected");
        }

        let mut seek = false;
        let mut capture = false;
        ui.horizontal(|ui| {
            let slider = egui::Slider::new(&mut self.seek_position, 0.0..=duration).show_value(false);
            seek = ui.add_enabled(loaded && duration > 0.0, slider).changed();
            ui.label(format!("{} / {}", video::timecode(self.seek_position), video::timecode(duration)));
            if let Some(frame) = self.session.video().frame() {
                ui.weak(format!("showing {}", video::timecode(frame.position)));
            }
            capture = ui.add_enabled(loaded, egui::Button::new("Capture frame")).clicked();
        });

        if seek {
            if let Some(cmd) = self.session.seek(self.seek_position) {
                if let VideoCommand::Seek { position, .. } = &cmd {
                    self.seek_position = *position;
                }
                self.send_video(cmd);
            }
        }
        if capture {
            self.capture(ctx);
        }
    }

    fn show_source(&mut self, ui: &mut egui::Ui) {
        let mode = self.session.state().mode();
        let can_capture = self.session.state().can_use_capture();
        let mut picked = None;

        ui.horizontal(|ui| {
            ui.label("Thumbnail source:");
            if ui.radio(mode == SourceMode::File, SourceMode::File.to_string()).clicked() {
                picked = Some(SourceMode::File);
            }
            let capture_radio = egui::RadioButton::new(mode == SourceMode::Capture, SourceMode::Capture.to_string());
            if ui.add_enabled(can_capture, capture_radio).on_disabled_hover_text("Capture a frame first").clicked() {
                picked = Some(SourceMode::Capture);
            }
        });

        match mode {
            SourceMode::File => {
                if let Some(path) = self.session.state().image_path() {
                    ui.add(egui::Image::new(format!("file://{}", path.display())).max_height(160.0));
                }
            },
            SourceMode::Capture => {
                if let (Some(image), Some(uri)) = (self.session.state().captured_frame(), &self.capture_uri) {
                    let bytes = egui::load::Bytes::Shared(image.png_bytes().clone());
                    ui.add(egui::Image::from_bytes(uri.clone(), bytes).max_height(160.0));
                }
            }
        }

        if let Some(mode) = picked {
            if let Err(e) = self.session.select_mode(mode) {
                warn!(error = %e, "thumbnail source change refused");
            }
        }
    }

    fn show_submit(&mut self, ui: &mut egui::Ui) {
        let mut submit = false;
        ui.horizontal(|ui| {
            submit = ui.add_enabled(!self.session.is_busy(), egui::Button::new("Set thumbnail")).clicked();
            if self.session.is_submitting() {
                ui.spinner();
                ui.label("Processing...");
            }
        });

        if let Some(video) = self.session.state().video_path() {
            ui.small(format!("Output: {}", embed::default_output_for(video).display()));
        }

        match self.session.status() {
            SubmissionStatus::Idle => {},
            SubmissionStatus::Success(message) => {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.colored_label(egui::Color32::GREEN, message);
                    if let Some(at) = self.finished_at {
                        ui.small(format!("Finished at {}", at.format("%H:%M:%S")));
                    }
                });
            },
            SubmissionStatus::Error(message) => {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.colored_label(egui::Color32::RED, message);
                });
            }
        }

        if submit {
            self.submit();
        }
    }
}
