use adw::prelude::*;
use adw::Application;
use gtk4::glib as gtk_glib;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::AppContext;
use crate::chat::ChatViewModel;
use crate::ui::chat_view::ChatView;
use crate::ui::sidebar::Sidebar;

pub fn show_main_window(app: &Application, ctx: AppContext) {
    let (vm, mut events) = match ChatViewModel::mount(&ctx, crate::utils::RUNTIME.handle().clone()) {
        Ok(mounted) => mounted,
        Err(e) => {
            log::info!("Chat unavailable ({e}), showing login");
            crate::ui::login::show_login_window(app, ctx);
            return;
        }
    };
    let vm = Rc::new(RefCell::new(vm));

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("WhatsApp")
        .default_width(960)
        .default_height(640)
        .build();

    let overlay = adw::ToastOverlay::new();

    let split = adw::Flap::builder()
        .reveal_flap(true)
        .locked(true)
        .modal(false)
        .build();

    let sidebar = Rc::new(Sidebar::new());
    split.set_flap(Some(&sidebar.widget()));

    let chat = Rc::new(ChatView::new());
    split.set_content(Some(&chat.widget()));

    overlay.set_child(Some(&split));

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk4::Label::new(Some(&format!("WhatsApp · {}", vm.borrow().credentials().instance_id)));
    header.set_title_widget(Some(&title));

    let logout_btn = gtk4::Button::with_label("Log out");
    header.pack_end(&logout_btn);
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));

    let refresh: Rc<dyn Fn()> = {
        let vm = vm.clone();
        let chat = chat.clone();
        let sidebar = sidebar.clone();
        Rc::new(move || {
            let vm = vm.borrow();
            chat.show_messages(vm.messages());
            chat.show_error(vm.last_error());
            sidebar.show_poll_state(vm.poll_state());
        })
    };
    (refresh)();
    window.present();

    // Poll events arrive from the runtime; fold them in on the main loop.
    // The channel closes on unmount or logout, which ends this future.
    {
        let vm = Rc::downgrade(&vm);
        let chat = chat.clone();
        let sidebar = sidebar.clone();
        gtk_glib::MainContext::default().spawn_local(async move {
            while let Some(event) = events.recv().await {
                let Some(vm) = vm.upgrade() else { break };
                let mut vm = vm.borrow_mut();
                if vm.apply(event) {
                    chat.show_messages(vm.messages());
                    chat.show_error(vm.last_error());
                    sidebar.show_poll_state(vm.poll_state());
                }
            }
        });
    }

    // Recipient field: reject anything but digits, '+', space and '-'.
    {
        let vm = vm.clone();
        sidebar.phone_entry.connect_changed(move |entry| {
            let text = entry.text().to_string();
            let accepted = vm.borrow_mut().set_phone_number(&text);
            if !accepted {
                let previous = vm.borrow().phone_number().to_string();
                entry.set_text(&previous);
                entry.set_position(-1);
            }
        });
    }

    {
        let vm = vm.clone();
        let refresh = refresh.clone();
        sidebar.pause_btn.connect_clicked(move |_| {
            vm.borrow_mut().toggle_polling();
            (refresh)();
        });
    }

    {
        let vm = vm.clone();
        chat.entry.connect_changed(move |entry| {
            vm.borrow_mut().set_input(&entry.text());
        });
    }

    let send: Rc<dyn Fn()> = {
        let vm = vm.clone();
        let chat = chat.clone();
        let refresh = refresh.clone();
        let api = ctx.api.clone();
        Rc::new(move || {
            let text = chat.entry.text().to_string();
            let prepared = vm.borrow_mut().prepare_send(&text);
            let outgoing = match prepared {
                Ok(outgoing) => outgoing,
                Err(_) => {
                    (refresh)();
                    return;
                }
            };
            chat.send_btn.set_sensitive(false);

            let api = api.clone();
            let creds = vm.borrow().credentials().clone();
            let rx = crate::utils::run_async_to_main(async move {
                let result = api.send_message(&creds, &outgoing.chat_id, &outgoing.text).await;
                Ok::<_, ()>((outgoing, result))
            });

            let vm = vm.clone();
            let chat = chat.clone();
            let refresh = refresh.clone();
            rx.attach(None, move |res| {
                if let Ok((outgoing, result)) = res {
                    let sent = vm.borrow_mut().complete_send(outgoing, result).is_ok();
                    if sent {
                        let input = vm.borrow().input().to_string();
                        chat.entry.set_text(&input);
                    }
                }
                chat.send_btn.set_sensitive(true);
                (refresh)();
                glib::ControlFlow::Continue
            });
        })
    };
    {
        let send = send.clone();
        chat.send_btn.connect_clicked(move |_| (send)());
    }
    {
        let send = send.clone();
        chat.entry.connect_activate(move |_| (send)());
    }

    {
        let vm = vm.clone();
        let app = app.clone();
        let window_for_logout = window.clone();
        let overlay = overlay.clone();
        logout_btn.connect_clicked(move |_| {
            let res = vm.borrow_mut().logout();
            match res {
                Ok(_) => {
                    crate::ui::login::show_login_window(&app, ctx.clone());
                    window_for_logout.close();
                }
                Err(e) => overlay.add_toast(adw::Toast::new(&format!("Failed to log out: {}", e))),
            }
        });
    }

    {
        let vm = vm.clone();
        window.connect_close_request(move |_| {
            vm.borrow_mut().unmount();
            gtk_glib::Propagation::Proceed
        });
    }
}
