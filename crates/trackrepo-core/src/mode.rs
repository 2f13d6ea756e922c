use crate::settings::{ConfigMode, RepositorySettings, SettingsError, SettingsField};

/// Checked/enabled flags of one mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorState {
    pub checked: bool,
    pub enabled: bool,
}

/// Widget state derived from the active mode.
///
/// The selector of the active mode is checked and disabled (it is already
/// selected), the other selector is unchecked and enabled, and the text fields
/// are editable only for a custom repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleState {
    pub mode: ConfigMode,
    pub default_selector: SelectorState,
    pub custom_selector: SelectorState,
    pub fields_enabled: bool,
}

impl ToggleState {
    pub fn for_mode(mode: ConfigMode) -> Self {
        let active = SelectorState {
            checked: true,
            enabled: false,
        };
        let inactive = SelectorState {
            checked: false,
            enabled: true,
        };

        match mode {
            ConfigMode::Default => Self {
                mode,
                default_selector: active,
                custom_selector: inactive,
                fields_enabled: false,
            },
            ConfigMode::Custom => Self {
                mode,
                default_selector: inactive,
                custom_selector: active,
                fields_enabled: true,
            },
        }
    }

    pub fn selector(&self, mode: ConfigMode) -> SelectorState {
        match mode {
            ConfigMode::Default => self.default_selector,
            ConfigMode::Custom => self.custom_selector,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CustomDraft {
    username: String,
    repository_name: String,
    branch_name: String,
}

impl CustomDraft {
    fn capture(settings: &RepositorySettings) -> Self {
        Self {
            username: settings.username.clone(),
            repository_name: settings.repository_name.clone(),
            branch_name: settings.branch_name.clone(),
        }
    }

    fn apply(&self, settings: &mut RepositorySettings) {
        settings.username.clone_from(&self.username);
        settings.repository_name.clone_from(&self.repository_name);
        settings.branch_name.clone_from(&self.branch_name);
    }
}

/// Owns the in-memory settings of one session and keeps field values and
/// editability consistent with the selected mode.
#[derive(Debug, Clone)]
pub struct ConfigModeController {
    settings: RepositorySettings,
    custom_draft: CustomDraft,
}

impl ConfigModeController {
    pub fn new(initial: RepositorySettings) -> Self {
        let custom_draft = match initial.mode {
            ConfigMode::Custom => CustomDraft::capture(&initial),
            ConfigMode::Default => CustomDraft::default(),
        };

        let mut controller = Self {
            settings: initial,
            custom_draft,
        };
        controller.set_mode(controller.settings.mode);
        controller
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    pub fn mode(&self) -> ConfigMode {
        self.settings.mode
    }

    pub fn toggle_state(&self) -> ToggleState {
        ToggleState::for_mode(self.settings.mode)
    }

    pub fn set_mode(&mut self, mode: ConfigMode) -> ToggleState {
        match mode {
            ConfigMode::Default => {
                if self.settings.mode == ConfigMode::Custom {
                    self.custom_draft = CustomDraft::capture(&self.settings);
                }
                self.settings = RepositorySettings::defaults();
            }
            ConfigMode::Custom => {
                if self.settings.mode == ConfigMode::Default {
                    self.settings.mode = ConfigMode::Custom;
                    self.custom_draft.apply(&mut self.settings);
                }
            }
        }

        self.toggle_state()
    }

    pub fn edit_field(&mut self, field: SettingsField, value: &str) -> Result<(), SettingsError> {
        if self.settings.mode == ConfigMode::Default {
            return Err(SettingsError::InvalidArgument {
                message: format!(
                    "{} is read-only while the default repository is selected",
                    field.label()
                ),
            });
        }

        let target = self.settings.field_mut(field);
        target.clear();
        target.push_str(value);
        Ok(())
    }
}
