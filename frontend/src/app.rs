use crate::components::single::SingleProspectComponent;
use crate::components::upload::UploadComponent;
use yew::{classes, html, Component, Context, Html};

pub enum Msg {
    SetTab(&'static str),
}

pub struct App {
    active_tab: &'static str,
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self { active_tab: "batch" }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SetTab(tab) => {
                let changed = self.active_tab != tab;
                self.active_tab = tab;
                changed
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let tab_class = |tab: &str| classes!("tab-btn", (self.active_tab == tab).then_some("active"));

        // Hidden panes stay mounted and keep polling.
        html! {
            <div class="app-root">
                <header class="app-header">
                    <h1>{"Pitch Deck Creator"}</h1>
                </header>
                <div class="tab-bar">
                    <button class={tab_class("batch")} onclick={link.callback(|_| Msg::SetTab("batch"))}>
                        {"Batch upload"}
                    </button>
                    <button class={tab_class("single")} onclick={link.callback(|_| Msg::SetTab("single"))}>
                        {"Single prospect"}
                    </button>
                </div>
                <div hidden={self.active_tab != "batch"}>
                    <UploadComponent />
                </div>
                <div hidden={self.active_tab != "single"}>
                    <SingleProspectComponent />
                </div>
            </div>
        }
    }
}
