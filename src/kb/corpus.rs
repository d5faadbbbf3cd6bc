//! Documentation corpus.
//!
//! Built once from ordered layers: the built-in documents, then an optional
//! JSON overlay whose entries replace a built-in document with the same id
//! in place or are appended. Nothing mutates a corpus after construction.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use super::html::strip_html;
use crate::types::{DeskError, Result};

/// One documentation section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// HTML body
    #[serde(rename = "content")]
    pub content_html: String,
}

impl Document {
    pub fn new(id: &str, title: &str, content_html: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            content_html: content_html.to_string(),
        }
    }

    pub fn plain_text(&self) -> String {
        strip_html(&self.content_html)
    }
}

/// Navigation entry pointing at a document id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
    nav: Vec<NavLink>,
}

impl Corpus {
    /// Built-in documents only
    pub fn builtin() -> Self {
        Self {
            documents: builtin_documents(),
            nav: builtin_nav(),
        }
    }

    /// Built-in documents with `overlay` layered on top
    pub fn with_overlay(overlay: Vec<Document>) -> Self {
        let mut documents = builtin_documents();
        for doc in overlay {
            match documents.iter_mut().find(|d| d.id == doc.id) {
                Some(existing) => {
                    debug!("Overlay replaces document {}", doc.id);
                    *existing = doc;
                }
                None => {
                    debug!("Overlay adds document {}", doc.id);
                    documents.push(doc);
                }
            }
        }
        Self {
            documents,
            nav: builtin_nav(),
        }
    }

    /// Load the corpus, reading the overlay file when one is configured
    pub fn load(overlay_path: Option<&Path>) -> Result<Self> {
        let Some(path) = overlay_path else {
            return Ok(Self::builtin());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            DeskError::Config(format!("Cannot read corpus overlay {}: {}", path.display(), e))
        })?;
        let overlay: Vec<Document> = serde_json::from_str(&raw).map_err(|e| {
            DeskError::Config(format!("Invalid corpus overlay {}: {}", path.display(), e))
        })?;

        info!("Loaded {} overlay documents from {}", overlay.len(), path.display());
        Ok(Self::with_overlay(overlay))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn nav(&self) -> &[NavLink] {
        &self.nav
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Look up a document, failing with `UnknownDocument`
    pub fn require(&self, id: &str) -> Result<&Document> {
        self.get(id)
            .ok_or_else(|| DeskError::UnknownDocument(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

// =============================================================================
// Built-in Content
// =============================================================================

fn builtin_nav() -> Vec<NavLink> {
    [
        ("blood-vision", "Blood Vision"),
        ("m1-sensor", "M1 Sensor"),
        ("ring-air", "Ring AIR"),
        ("ring-rare", "Ring RARE"),
        ("powerplug", "PowerPlugs"),
        ("ultrahuman-home", "Ultrahuman Home"),
        ("sops", "SOPs & Procedures"),
        ("ultrahumanx", "UltrahumanX"),
        ("chat-email-handling", "Chat & Email"),
        ("misc", "Misc"),
    ]
    .into_iter()
    .map(|(id, label)| NavLink {
        id: id.to_string(),
        label: label.to_string(),
    })
    .collect()
}

fn builtin_documents() -> Vec<Document> {
    vec![
        Document::new(
            "blood-vision",
            "Blood Vision Documentation",
            r#"<h3>Blood Vision Overview</h3>
<p>Blood Vision is a preventive blood testing service. UltraTrace links sleep, resting heart rate, heart rate variability and activity from the ring with key blood markers and gives users a probability score for how lifestyle changes move each marker.</p>
<h3>How secure is my Blood Vision data?</h3>
<p>Blood and genetic data is never sold. Testing runs through a HIPAA-compliant entity in the US. Users can access, download or delete their data at any time.</p>
<h3>Lab quality &amp; transparency</h3>
<p>Tests in the United States are processed by Quest Diagnostics under CLIA certification. Tests in India are handled by a NABL-accredited lab network. The lab ID and timestamp are visible in the app.</p>
<h3>Blood Vision Refunds</h3>
<p>Cancellations before sample collection are refunded in full. After collection, escalate to the finance queue with the order ID and lab booking reference.</p>"#,
        ),
        Document::new(
            "m1-sensor",
            "M1 Sensor Documentation",
            r#"<h3>Ultrahuman M1 Overview</h3>
<p>M1 is a continuous glucose monitor. A small filament under the skin reads glucose from interstitial fluid every few minutes.</p>
<h4>Types Of Sensors &amp; Regions</h4>
<p>India uses Libre 1 and Libre Pro with scanning. EU, UK and UAE use Libre 2 with limited live updates. The USA uses Libre 3 Plus with live updates and no scanning.</p>
<h3>Common Issues &amp; Solutions</h3>
<h4>Invalid Readings</h4>
<p>Values below 40 or above 400 for more than six hours mean the sensor should be replaced.</p>
<h4>Failed To Start</h4>
<p>If the sensor age does not start counting after two or three attempts, replace the sensor.</p>
<h4>Unable To Scan</h4>
<p>Restart the phone, toggle NFC and remove the phone case before scanning again.</p>"#,
        ),
        Document::new(
            "ring-air",
            "Ring AIR Documentation",
            r#"<h3>Ultrahuman Ring AIR Knowledge Base</h3>
<p>Product overview, sizing, circadian rhythm guidance, app walkthroughs and referral flows for Ring AIR.</p>
<ul>
<li>Key features, box contents and colorways</li>
<li>App metrics, biomarker explainers and circadian rhythm playbooks</li>
<li>Battery Health Wizard, troubleshooting flows and sizing charts</li>
</ul>"#,
        ),
        Document::new(
            "ring-rare",
            "Ring RARE Documentation",
            r#"<h3>Ring RARE Overview</h3>
<p>Quick reference for the Ring RARE hardware variant: setup, pairing, sizing and day-one expectations.</p>
<h4>Support Playbooks</h4>
<ol>
<li>Eligibility and replacement criteria for RARE units.</li>
<li>When to escalate to hardware QA or logistics.</li>
<li>Shipping, sizing swaps and return steps.</li>
</ol>"#,
        ),
        Document::new(
            "powerplug",
            "PowerPlug Documentation",
            r#"<h3>PowerPlug Overview</h3>
<p>PowerPlugs are add-on features in the app. Some are free and some need a premium subscription.</p>
<h4>Available PowerPlugs</h4>
<p>AFib detection, circadian rhythm, caffeine window, vitamin D, cycle tracking, pregnancy mode, jet lag and cardio adaptability.</p>
<h3>Common Issues</h3>
<h4>Data Not Syncing</h4>
<p>Check background sync and location permissions, then force a sync from the app.</p>
<h4>Subscription Not Activating</h4>
<p>Confirm the purchase email matches the app account before escalating to billing.</p>"#,
        ),
        Document::new(
            "ultrahuman-home",
            "Ultrahuman Home Documentation",
            r#"<h3>Ultrahuman Home Overview</h3>
<p>Ultrahuman Home monitors environmental factors at home such as air quality, temperature, humidity, noise and light.</p>
<h3>Setup &amp; Usage</h3>
<p>Place the device in the main living area away from windows and vents. Several users can share one device.</p>"#,
        ),
        Document::new(
            "sops",
            "SOPs & Procedures Documentation",
            r#"<h3>Chat Handling &amp; Flagging SOP</h3>
<p>Standard procedure for support chats. When an issue needs the internal team, send the holding message, paste the flagged link in the ticket details and move the chat to the flagged queue.</p>
<h3>Flagging Guidelines</h3>
<p>Ops handles delivery estimates, customs and address changes. Finance handles refunds, bank transfers and invoices. Tech handles firmware issues, app errors and unusual ring problems.</p>
<h3>Replacement Flow</h3>
<p>Step 1: verify warranty. Step 2: run the battery health wizard. Step 3: collect photos. Step 4: escalate to replacement.</p>"#,
        ),
        Document::new(
            "ultrahumanx",
            "UltrahumanX Documentation",
            r#"<h3>UltrahumanX Overview</h3>
<p>Concierge flows, benefits and escalation map for UltrahumanX members.</p>
<ul>
<li>Verify membership status and perk eligibility.</li>
<li>Priority routing, SLA expectations and follow-up cadence.</li>
</ul>
<h4>Escalation &amp; Recovery</h4>
<p>Flag criteria for white-glove outreach and service recovery credits that need manager approval.</p>"#,
        ),
        Document::new(
            "chat-email-handling",
            "Chat and Email Handling",
            r#"<h3>Chat &amp; Email Handling</h3>
<p>Guidelines that keep tone, macros and SLAs consistent across chat and email.</p>
<h4>Quality Checklist</h4>
<ol>
<li>Confirm user identity and device context.</li>
<li>Summarize the issue back to the user before proposing fixes.</li>
<li>Document next steps and share turnaround commitments.</li>
</ol>"#,
        ),
        Document::new(
            "misc",
            "Miscellaneous Resources",
            r#"<h3>Miscellaneous References</h3>
<p>Quick links, release notes and a glossary of product names, acronyms and internal tags.</p>"#,
        ),
    ]
}
