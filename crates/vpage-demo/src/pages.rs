//! Demo pages
//!
//! Home page, a second page that registers the third page on first show,
//! and a third page that renders the result of a data request.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use smol::Timer;
use std::rc::Rc;
use std::time::Duration;
use vpage::{Binder, Navigation, Page};
use vpage_templates::{MemorySource, TemplateCache};

pub type Templates = Rc<TemplateCache<MemorySource>>;

pub const HOME_TEMPLATE: &str = "templates/HomePage.html";
pub const SECOND_TEMPLATE: &str = "templates/SecondPage.html";
pub const THIRD_TEMPLATE: &str = "templates/ThirdPage.html";

/// Template source with the demo templates
pub fn template_source() -> MemorySource {
    MemorySource::new()
        .with(
            HOME_TEMPLATE,
            "<h1>{{title}}</h1>\
             <p>{{description}}</p>\
             <button id='HomeNextPageButton'>Next</button>",
        )
        .with(
            SECOND_TEMPLATE,
            "<h1>{{title}}</h1>\
             <p>{{description}}</p>\
             <button id='SecondPageNextButton'>Next</button>",
        )
        .with(
            THIRD_TEMPLATE,
            "<h1>{{title}}</h1>\
             <p>{{description}}</p>\
             <img src='avatar.png'>\
             <dl>\
             <dt>Handle</dt><dd>{{handle}}</dd>\
             <dt>City</dt><dd>{{city}}</dd>\
             <dt>Favorite OS</dt><dd>{{favOs}}</dd>\
             <dt>Favorite color</dt><dd>{{favColor}}</dd>\
             <dt>Favorite band</dt><dd>{{favBand}}</dd>\
             </dl>\
             <blockquote>{{quote}}</blockquote>\
             <button id='HomePageButton'>Home</button>\
             <button id='SecondPageButton'>Back to second</button>",
        )
}

/// Start loading a template in the background
fn preload(binder: &Binder, templates: &Templates, path: &'static str) {
    let templates = templates.clone();
    binder
        .spawn(async move {
            if let Err(e) = templates.load(path).await {
                tracing::error!("Failed to load '{}': {}", path, e);
            }
        })
        .detach();
}

pub struct HomePage {
    templates: Templates,
}

impl HomePage {
    pub fn new(binder: &Binder, templates: Templates) -> Self {
        preload(binder, &templates, HOME_TEMPLATE);
        Self { templates }
    }
}

impl Page for HomePage {
    fn id(&self) -> &str {
        "homePage"
    }

    fn title(&self) -> &str {
        "Home Page"
    }

    fn render(&self, binder: &Binder, _navigation: &Navigation) -> anyhow::Result<()> {
        let data = json!({
            "title": "Home Page!",
            "description": "Here's the content of the home page. Below is a button to navigate to the next page."
        });
        binder.replace(&self.templates.get(HOME_TEMPLATE, &data)?);
        Ok(())
    }
}

pub struct SecondPage {
    templates: Templates,
}

impl SecondPage {
    pub fn new(binder: &Binder, templates: Templates) -> Self {
        preload(binder, &templates, SECOND_TEMPLATE);
        Self { templates }
    }
}

impl Page for SecondPage {
    fn id(&self) -> &str {
        "secondPage"
    }

    fn title(&self) -> &str {
        "The Second Page"
    }

    fn render(&self, binder: &Binder, navigation: &Navigation) -> anyhow::Result<()> {
        if let Some(calling) = navigation.field("callingPage") {
            tracing::info!("callingPage: {}", calling);
        }

        let data = json!({
            "title": "The Second Page!",
            "description": "We are now at the second page."
        });
        binder.replace(&self.templates.get(SECOND_TEMPLATE, &data)?);

        if !binder.contains_page("thirdPage") {
            binder.add_page(ThirdPage::new(binder, self.templates.clone()))?;
        }

        binder.update_scroll_position()?;
        Ok(())
    }
}

/// Response of the demo data request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub handle: String,
    pub city: String,
    pub fav_os: String,
    pub fav_color: String,
    pub fav_band: String,
    pub quote: String,
}

const DATA_RESPONSE: &str = r#"{
    "handle": "rsv-code",
    "city": "Roseville, CA, USA",
    "favOs": "Ubuntu",
    "favColor": "Blue",
    "favBand": "Queen",
    "quote": "When deep space exploration ramps up, it'll be the corporations that name everything, the IBM Stellar Sphere, the Microsoft Galaxy, Planet Starbucks."
}"#;

/// Simulated remote call
pub async fn data_request(latency: Duration) -> anyhow::Result<UserData> {
    Timer::after(latency).await;
    Ok(serde_json::from_str(DATA_RESPONSE)?)
}

pub struct ThirdPage {
    templates: Templates,
    latency: Duration,
}

impl ThirdPage {
    pub fn new(binder: &Binder, templates: Templates) -> Self {
        preload(binder, &templates, THIRD_TEMPLATE);
        Self {
            templates,
            latency: Duration::from_millis(50),
        }
    }
}

impl Page for ThirdPage {
    fn id(&self) -> &str {
        "thirdPage"
    }

    fn title(&self) -> &str {
        "The Third Page"
    }

    fn render(&self, binder: &Binder, _navigation: &Navigation) -> anyhow::Result<()> {
        let templates = self.templates.clone();
        let latency = self.latency;
        let handle = binder.clone();
        binder
            .spawn(async move {
                let result = match data_request(latency).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!("Data request failed: {}", e);
                        return;
                    }
                };
                if handle.current_page().as_deref() != Some("thirdPage") {
                    tracing::debug!("Data request finished after leaving the third page");
                    return;
                }
                if let Err(e) = show_data_result(&handle, &templates, result) {
                    tracing::error!("Third page failed: {}", e);
                }
            })
            .detach();
        Ok(())
    }
}

fn show_data_result(binder: &Binder, templates: &Templates, result: UserData) -> anyhow::Result<()> {
    let mut data = json!({
        "title": "The Third Page!",
        "description": "This one makes a data request for some user data and presents it."
    });
    if let (Some(data), Value::Object(result)) = (data.as_object_mut(), serde_json::to_value(result)?) {
        data.extend(result);
    }

    binder.replace(&templates.get(THIRD_TEMPLATE, &data)?);
    binder.update_scroll_position()?;
    Ok(())
}
