//! QR Code Widget

use leptos::prelude::*;

use crate::api::{self, QrParams};

#[component]
pub fn QrPage() -> impl IntoView {
    let defaults = QrParams::default();

    let (text, set_text) = signal(defaults.text);
    let (size, set_size) = signal(defaults.size);
    let (margin, set_margin) = signal(defaults.margin);
    let (ecc, set_ecc) = signal(defaults.ecc);
    let (dark, set_dark) = signal(defaults.dark);
    let (light, set_light) = signal(defaults.light);

    let (status, set_status) = signal(String::from("Ready."));
    let (preview, set_preview) = signal(String::new());
    // Parameters of the image currently shown; downloads are enabled while set
    let (rendered, set_rendered) = signal(None::<QrParams>);

    let params = move || QrParams {
        text: text.get(),
        size: size.get(),
        margin: margin.get(),
        ecc: ecc.get(),
        dark: dark.get(),
        light: light.get(),
    };

    let reset_output = move || {
        set_rendered.set(None);
        set_preview.set(String::new());
    };

    let generate = move |_| {
        let current = params();
        if current.text.trim().is_empty() {
            set_status.set("Enter some text or a URL to generate a QR code.".into());
            reset_output();
            return;
        }

        set_status.set("Generating…".into());
        leptos::task::spawn_local(async move {
            match api::render_svg(&current).await {
                Ok(svg) => {
                    set_preview.set(svg);
                    set_rendered.set(Some(current));
                    set_status.set("Done. You can download as PNG or SVG.".into());
                }
                Err(e) => {
                    set_status.set(format!("Error: {e}"));
                    reset_output();
                }
            }
        });
    };

    let clear = move |_| {
        set_text.set(String::new());
        set_status.set("Cleared.".into());
        reset_output();
    };

    let download_href = move |format: &'static str| {
        rendered
            .get()
            .and_then(|p| api::qr_url(&api::origin(), &p, format, true).ok())
            .unwrap_or_else(|| "#".into())
    };

    let guard_download = move |ev: leptos::ev::MouseEvent| {
        if rendered.get_untracked().is_none() {
            ev.prevent_default();
        }
    };

    view! {
        <div class="qr">
            <aside class="sidebar">
                <h2>"QR Code"</h2>

                <div class="field">
                    <label>"Text or URL"</label>
                    <textarea
                        rows="4"
                        prop:value=move || text.get()
                        on:input=move |ev| set_text.set(event_target_value(&ev))
                    />
                </div>

                <div class="field">
                    <label>"Size (px)"</label>
                    <input
                        type="number"
                        min="64"
                        prop:value=move || size.get()
                        on:input=move |ev| set_size.set(event_target_value(&ev))
                    />
                </div>

                <div class="field">
                    <label>"Margin (modules)"</label>
                    <input
                        type="number"
                        min="0"
                        prop:value=move || margin.get()
                        on:input=move |ev| set_margin.set(event_target_value(&ev))
                    />
                </div>

                <div class="field">
                    <label>"Error correction"</label>
                    <select
                        prop:value=move || ecc.get()
                        on:change=move |ev| set_ecc.set(event_target_value(&ev))
                    >
                        <option value="L">"L (7%)"</option>
                        <option value="M">"M (15%)"</option>
                        <option value="Q">"Q (25%)"</option>
                        <option value="H">"H (30%)"</option>
                    </select>
                </div>

                <div class="field colors">
                    <label>"Dark"</label>
                    <input
                        type="color"
                        prop:value=move || dark.get()
                        on:input=move |ev| set_dark.set(event_target_value(&ev))
                    />
                    <label>"Light"</label>
                    <input
                        type="color"
                        prop:value=move || light.get()
                        on:input=move |ev| set_light.set(event_target_value(&ev))
                    />
                </div>

                <div class="actions">
                    <button class="btn btn-primary" on:click=generate>"Generate"</button>
                    <button class="btn" on:click=clear>"Clear"</button>
                </div>
            </aside>

            <main class="qr-main">
                <div class="qr-preview" inner_html=move || preview.get()></div>
                <p class="status">{move || status.get()}</p>

                <div class="downloads">
                    <a
                        class="btn"
                        class:disabled=move || rendered.get().is_none()
                        href=move || download_href("png")
                        download="qr.png"
                        on:click=guard_download
                    >
                        "Download PNG"
                    </a>
                    <a
                        class="btn"
                        class:disabled=move || rendered.get().is_none()
                        href=move || download_href("svg")
                        download="qr.svg"
                        on:click=guard_download
                    >
                        "Download SVG"
                    </a>
                </div>
            </main>
        </div>
    }
}
