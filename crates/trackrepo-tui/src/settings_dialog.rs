use crossterm::event::{Event, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use trackrepo_app::dialog::{DialogController, Feedback, FeedbackKind};
use trackrepo_core::mode::ToggleState;
use trackrepo_core::settings::{ConfigMode, SETTINGS_FIELDS, SettingsField};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::keymap;
use crate::theme;
use crate::ui::loading::LoadingState;
use crate::ui::modal::{ModalSpec, render_modal};
use crate::ui::text::{compact_hint, fit_to_width, label_value_line};

const LABEL_WIDTH: usize = 15;
// "{label}: " as rendered by label_value_line.
const VALUE_OFFSET: usize = LABEL_WIDTH + 2;

const DESCRIPTION: &str = "Choose where track layouts are downloaded from.";
// Description, blank, one row per source selector, blank. Rows above the
// fields are clipped to the body width so they never wrap.
const FIRST_FIELD_ROW: u16 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogExit {
    Saved(Feedback),
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Mode,
    Field(SettingsField),
    Save,
}

pub(crate) struct SettingsScreen {
    dialog: DialogController,
    focus: Focus,
    inputs: [Input; 3],
    loading: LoadingState,
    toast: Option<Feedback>,
    error: Option<String>,
}

impl SettingsScreen {
    pub(crate) fn new(dialog: DialogController) -> Self {
        let mut screen = Self {
            dialog,
            focus: Focus::Mode,
            inputs: [Input::default(), Input::default(), Input::default()],
            loading: LoadingState::default(),
            toast: None,
            error: None,
        };
        screen.sync_inputs();
        screen
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Option<DialogExit> {
        if keymap::is_back(key) {
            self.dialog.cancel();
            return Some(DialogExit::Canceled);
        }

        if self.dialog.is_validating() {
            return None;
        }

        if keymap::is_confirm(key) {
            return self.save();
        }

        if keymap::is_next_focus(key) {
            self.move_focus(1);
            return None;
        }

        if keymap::is_prev_focus(key) {
            self.move_focus(-1);
            return None;
        }

        match self.focus {
            Focus::Mode if keymap::is_toggle(key) => {
                let next = self.dialog.toggle_state().mode.other();
                match self.dialog.toggle_mode(next) {
                    Ok(_) => {
                        self.clear_notices();
                        self.sync_inputs();
                    }
                    Err(error) => self.error = Some(error.to_string()),
                }
            }
            Focus::Field(field) if self.dialog.toggle_state().fields_enabled => {
                let input = &mut self.inputs[field_index(field)];
                if input.handle_event(&Event::Key(key)).is_some() {
                    let value = input.value().to_string();
                    self.clear_notices();
                    if let Err(error) = self.dialog.edit_field(field, value) {
                        self.error = Some(error.to_string());
                    }
                }
            }
            _ => {}
        }

        None
    }

    /// Advances the spinner and applies a finished repository check.
    pub(crate) fn on_tick(&mut self) -> Option<DialogExit> {
        if !self.dialog.is_validating() {
            return None;
        }

        self.loading.next_frame();
        let feedback = self.dialog.poll()?;
        self.finish(feedback)
    }

    pub(crate) fn is_validating(&self) -> bool {
        self.dialog.is_validating()
    }

    fn save(&mut self) -> Option<DialogExit> {
        self.clear_notices();
        match self.dialog.save() {
            Ok(Some(feedback)) => self.finish(feedback),
            Ok(None) => {
                self.loading.reset();
                None
            }
            Err(error) => {
                self.error = Some(error.to_string());
                None
            }
        }
    }

    fn finish(&mut self, feedback: Feedback) -> Option<DialogExit> {
        if !feedback.keep_open {
            return Some(DialogExit::Saved(feedback));
        }

        if let FeedbackKind::FieldRequired(field) = feedback.kind {
            self.focus = Focus::Field(field);
        }
        self.toast = Some(feedback);
        None
    }

    fn clear_notices(&mut self) {
        self.toast = None;
        self.error = None;
    }

    fn sync_inputs(&mut self) {
        let settings = self.dialog.settings();
        for field in SETTINGS_FIELDS {
            self.inputs[field_index(field)] = Input::new(settings.field(field).to_string());
        }

        if !self.dialog.toggle_state().fields_enabled && matches!(self.focus, Focus::Field(_)) {
            self.focus = Focus::Mode;
        }
    }

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Mode];
        if self.dialog.toggle_state().fields_enabled {
            order.extend(SETTINGS_FIELDS.map(Focus::Field));
        }
        order.push(Focus::Save);
        order
    }

    fn move_focus(&mut self, step: isize) {
        let order = self.focus_order();
        let current = order
            .iter()
            .position(|focus| *focus == self.focus)
            .unwrap_or(0);
        let next = (current as isize + step).rem_euclid(order.len() as isize) as usize;
        self.focus = order[next];
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let toggle = self.dialog.toggle_state();
        let key_hint = compact_hint(
            frame.area().width,
            "Enter: save    Tab/Up/Down: move    Space/Left/Right: switch source    Esc: cancel",
            "Enter: save    Tab: move    Space: switch source    Esc: cancel",
            "Enter save | Tab move | Esc cancel",
        );

        let inner_width = self.inner_width(frame.area());
        let value_width = inner_width.saturating_sub(VALUE_OFFSET);

        let mut lines = vec![
            Line::styled(fit_to_width(DESCRIPTION, inner_width), theme::secondary_text()),
            Line::from(""),
        ];
        lines.extend(self.mode_lines(toggle, inner_width));
        lines.push(Line::from(""));
        for field in SETTINGS_FIELDS {
            lines.push(self.field_line(field, toggle, value_width));
        }
        lines.push(Line::from(""));
        lines.push(self.save_line());
        lines.push(Line::from(""));
        lines.extend(self.status_line());

        let rendered = render_modal(
            frame,
            ModalSpec {
                title: "Repository settings",
                title_style: Some(theme::focus_prompt()),
                body: Text::from(lines),
                key_hint: Some(key_hint),
                width_pct: 80,
                height_pct: 60,
            },
        );

        if let Focus::Field(field) = self.focus
            && toggle.fields_enabled
            && !self.dialog.is_validating()
        {
            self.place_cursor(frame, rendered.body_area, field);
        }
    }

    fn mode_lines(&self, toggle: ToggleState, width: usize) -> [Line<'static>; 2] {
        [ConfigMode::Default, ConfigMode::Custom].map(|mode| {
            let selector = toggle.selector(mode);
            let marker = if selector.checked { "(•)" } else { "( )" };
            let style = if selector.enabled {
                Style::default()
            } else {
                theme::disabled_text()
            };
            let text = fit_to_width(&format!("{marker} {}", mode.label()), width);

            let line = Line::from(Span::styled(text, style));
            if self.focus == Focus::Mode {
                line.style(theme::focused_row())
            } else {
                line
            }
        })
    }

    fn field_line(&self, field: SettingsField, toggle: ToggleState, width: usize) -> Line<'static> {
        let input = &self.inputs[field_index(field)];
        let scroll = input.visual_scroll(width);
        let visible: String = input.value().chars().skip(scroll).take(width).collect();
        let label = format!("{:<LABEL_WIDTH$}", field.label());

        let line = label_value_line(label, visible);
        if !toggle.fields_enabled {
            line.style(theme::disabled_text())
        } else if self.focus == Focus::Field(field) {
            line.style(theme::focus_prompt())
        } else {
            line
        }
    }

    fn save_line(&self) -> Line<'static> {
        if self.focus == Focus::Save {
            Line::styled("[ Save ]", theme::focused_row())
        } else {
            Line::from("[ Save ]")
        }
    }

    fn status_line(&self) -> Option<Line<'static>> {
        if self.dialog.is_validating() {
            let slug = self.dialog.settings().slug();
            return Some(self.loading.line(&format!("Checking {slug} on GitHub...")));
        }

        if let Some(error) = &self.error {
            return Some(Line::styled(error.clone(), theme::error_prompt()));
        }

        self.toast.as_ref().map(|feedback| {
            let style = if feedback.is_success() {
                theme::success_prompt()
            } else {
                theme::error_prompt()
            };
            Line::styled(feedback.message.clone(), style)
        })
    }

    fn inner_width(&self, screen: Rect) -> usize {
        let modal = crate::centered_rect(80, 60, screen);
        modal.width.saturating_sub(2) as usize
    }

    fn place_cursor(&self, frame: &mut Frame<'_>, body: Rect, field: SettingsField) {
        let inner_width = body.width.saturating_sub(2) as usize;
        let width = inner_width.saturating_sub(VALUE_OFFSET);
        let row = FIRST_FIELD_ROW + field_index(field) as u16;
        if width == 0 || row + 2 >= body.height {
            return;
        }

        let input = &self.inputs[field_index(field)];
        let scroll = input.visual_scroll(width);
        let relative = input
            .visual_cursor()
            .saturating_sub(scroll)
            .min(width.saturating_sub(1));
        frame.set_cursor_position((
            body.x + 1 + (VALUE_OFFSET + relative) as u16,
            body.y + 1 + row,
        ));
    }
}

fn field_index(field: SettingsField) -> usize {
    match field {
        SettingsField::Username => 0,
        SettingsField::RepositoryName => 1,
        SettingsField::BranchName => 2,
    }
}
