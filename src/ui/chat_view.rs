use gtk4::prelude::*;
use gtk4 as gtk;
use std::cell::Cell;

use crate::api::Message;

/// Conversation column: message list, inline error and the compose row.
pub struct ChatView {
    root: gtk::Box,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    error_label: gtk::Label,
    pub entry: gtk::Entry,
    pub send_btn: gtk::Button,
    shown: Cell<usize>,
}

impl ChatView {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        let error_label = gtk::Label::new(None);
        error_label.add_css_class("error");
        error_label.set_halign(gtk::Align::Start);
        error_label.set_wrap(true);
        error_label.set_visible(false);
        root.append(&error_label);

        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message…"));
        let send_btn = gtk::Button::with_label("Send");
        send_btn.add_css_class("suggested-action");
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);

        Self {
            root,
            scroller,
            messages_box,
            error_label,
            entry,
            send_btn,
            shown: Cell::new(0),
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Appends the messages not yet on screen. The list only ever grows.
    pub fn show_messages(&self, messages: &[Message]) {
        let shown = self.shown.get();
        if messages.len() <= shown {
            return;
        }
        for msg in &messages[shown..] {
            let lbl = gtk::Label::new(Some(&msg.text));
            lbl.set_wrap(true);
            lbl.set_selectable(true);
            if msg.from_user {
                lbl.set_halign(gtk::Align::End);
                lbl.add_css_class("accent");
            } else {
                lbl.set_halign(gtk::Align::Start);
            }
            self.messages_box.append(&lbl);
        }
        self.shown.set(messages.len());
        let adj = self.scroller.vadjustment();
        adj.set_value(adj.upper());
    }

    pub fn show_error(&self, error: Option<&str>) {
        match error {
            Some(text) => {
                self.error_label.set_label(text);
                self.error_label.set_visible(true);
            }
            None => self.error_label.set_visible(false),
        }
    }
}
