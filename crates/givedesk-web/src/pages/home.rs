//! Home Page

use leptos::prelude::*;

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <div class="home">
            <header class="hero">
                <h1>"GHK Music Foundation"</h1>
                <p class="tagline">"Tools for our programs and supporters"</p>
                <div class="cta">
                    <a href="/qr" class="btn btn-primary">"QR Code Generator"</a>
                </div>
            </header>

            <section class="features">
                <div class="feature">
                    <h3>"Share links"</h3>
                    <p>"Turn any URL or text into a QR code for flyers and programs."</p>
                </div>
                <div class="feature">
                    <h3>"Print ready"</h3>
                    <p>"Download as PNG for quick use or SVG for crisp print at any size."</p>
                </div>
            </section>
        </div>
    }
}
