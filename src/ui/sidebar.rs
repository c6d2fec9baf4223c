use gtk4::prelude::*;
use gtk4 as gtk;

use crate::poll::{PollState, StopReason};

/// Side panel with the recipient number and the polling control.
pub struct Sidebar {
    root: gtk::Box,
    pub phone_entry: gtk::Entry,
    pub pause_btn: gtk::Button,
    status: gtk::Label,
}

impl Sidebar {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);
        root.set_width_request(240);

        let title = gtk::Label::new(Some("Recipient"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let phone_entry = gtk::Entry::new();
        phone_entry.set_placeholder_text(Some("Phone number, e.g. +7 912 345-67-89"));
        phone_entry.set_input_purpose(gtk::InputPurpose::Phone);
        root.append(&phone_entry);

        let status = gtk::Label::new(None);
        status.add_css_class("dim-label");
        status.set_halign(gtk::Align::Start);
        status.set_margin_top(12);
        root.append(&status);

        let pause_btn = gtk::Button::with_label("Pause");
        pause_btn.set_halign(gtk::Align::Start);
        root.append(&pause_btn);

        Self { root, phone_entry, pause_btn, status }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn show_poll_state(&self, state: PollState) {
        let (status, button, sensitive) = match state {
            PollState::Polling => ("Receiving messages", "Pause", true),
            PollState::Stopped(StopReason::UserPaused) => ("Paused", "Resume", true),
            PollState::Stopped(StopReason::Error) => ("Stopped after an error. Reopen the chat to retry.", "Resume", false),
            PollState::Idle => ("Not receiving", "Resume", false),
        };
        self.status.set_label(status);
        self.pause_btn.set_label(button);
        self.pause_btn.set_sensitive(sensitive);
    }
}
