use gtk::prelude::*;
use relm4::gtk;
use relm4::prelude::*;

/// Describes one failure for [ErrorDialog] to present.
#[derive(Debug)]
pub struct Notice {
    /// Short statement of what failed.
    pub summary: String,
    /// The underlying error text.
    pub detail: String,
}

/// Modal dialog presenting a failure until the user dismisses it.
///
/// Hides itself on dismissal; the owner only ever sends [Input::Show].
pub struct ErrorDialog {
    hidden: bool,
    notice: Notice,
}

/// Input messages for [ErrorDialog].
#[derive(Debug)]
pub enum Input {
    Show(Notice),
    // Internal:
    Dismissed,
}

#[relm4::component(pub)]
impl SimpleComponent for ErrorDialog {
    type Input = Input;
    type Output = ();
    type Init = ();

    view! {
        #[root]
        gtk::MessageDialog {
            set_modal: true,
            set_message_type: gtk::MessageType::Error,
            #[watch]
            set_visible: !model.hidden,
            #[watch]
            set_text: Some(&model.notice.summary),
            #[watch]
            set_secondary_text: Some(&model.notice.detail),
            add_button: ("Dismiss", gtk::ResponseType::Close),

            connect_response[sender] => move |_, _| {
                sender.input(Input::Dismissed);
            }
        }
    }

    fn init(
        _init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let model = Self {
            hidden: true,
            notice: Notice {
                summary: "".into(),
                detail: "".into(),
            },
        };
        let widgets = view_output!();
        ComponentParts { model, widgets }
    }

    fn update(&mut self, message: Self::Input, _sender: ComponentSender<Self>) {
        match message {
            Input::Show(notice) => {
                self.notice = notice;
                self.hidden = false;
            }
            Input::Dismissed => {
                self.hidden = true;
            }
        }
    }
}
