// src/adapters/agencies.rs

//! Built-in adapters for the monitored Rennes agencies.
//!
//! Most agencies fit [`SelectorAdapter`]; the few with their own extraction
//! policy get a dedicated type below.

use scraper::Selector;

use super::{
    Adapter, AdapterRegistry, Candidate, LabelledReference, LinkExtractor, Page,
    SelectorAdapter, element_text, parse_selector,
};
use crate::error::Result;
use crate::models::{Announcement, SourceSelectors};
use crate::utils::last_path_segment;

/// Register every built-in agency.
pub(super) fn register_all(registry: &mut AdapterRegistry) -> Result<()> {
    for (key, title, selectors) in two_phase_agencies() {
        registry.register(key, SelectorAdapter::new(&selectors)?.with_title(title));
    }

    registry.register("square-habitat", SquareHabitat::new()?);
    registry.register("ca-immobilier", CaImmobilier::new()?);
    registry.register("la-foret-immobilier", LaForet::new()?);
    Ok(())
}

fn two_phase_agencies() -> Vec<(&'static str, &'static str, SourceSelectors)> {
    vec![
        (
            "afedim",
            "Afedim",
            SourceSelectors::new(
                "#C\\:blocRecherche\\.blocRechercheDesk\\.P\\.C\\:U li.item",
                "span[class*='note']",
                "Référence du bien :",
            )
            .with_link("div div div:last-child span a")
            .with_prefix("https://www.afedim.fr"),
        ),
        (
            "giboire",
            "Giboire",
            SourceSelectors::new(
                ".result-grid_wrap div article",
                "p.presentation-bien_exclu_desc_ref",
                "Réf :",
            )
            .with_link("div:nth-child(2) h2 a"),
        ),
        (
            "foncia",
            "Foncia",
            SourceSelectors::new(
                "div.p-col-12.mosaic-list.large.ng-star-inserted div div:nth-child(2)",
                "p.section-reference",
                "Réf.",
            )
            .with_prefix("https://fr.foncia.com")
            .deduplicated(),
        ),
        (
            "agence-du-colombier",
            "Agence du Colombier",
            SourceSelectors::new(
                "div#listing_ajax_container div.listing_wrapper",
                "div.wpestate_estate_property_design_intext_details p",
                "REF:",
            ),
        ),
        (
            "la-francaise-immobiliere",
            "La Française Immobilière",
            SourceSelectors::new("div#liste_annonces div.row > article", "p.ref.d-inline", "Réf :")
                .with_link("a[rel='bookmark']"),
        ),
        (
            "guenno",
            "Guenno",
            SourceSelectors::new(
                "div.section-content article",
                "div#realty_area.realty_details span.grey-ref",
                "Ref :",
            ),
        ),
        (
            "la-motte",
            "La Motte",
            SourceSelectors::new(
                "div.col-12.pr-md-0.col__list div#result div.bien__wrapper--annonce",
                "div.heading__delivery p.tva",
                "Lot",
            ),
        ),
        (
            "kermarrec",
            "Kermarrec",
            SourceSelectors::new(
                "div#primary.content-area.listofposts.grid article",
                "header.container.entry-header span.ref",
                "(ref :",
            )
            .with_link("div.panel div.entry-content a"),
        ),
        (
            "nestenn",
            "Nestenn",
            SourceSelectors::new(
                "div#gridPropertyOnlyWidening div.relative.grid_map_container",
                "div.property_ref",
                "Réf :",
            ),
        ),
        (
            "pigeault-immobilier",
            "Pigeault Immobilier",
            SourceSelectors::new("div#liste_annonces div.row article", "div#top_infos p.ref", "Réf :")
                .with_link("a[rel='bookmark']"),
        ),
        (
            "cogir",
            "Cogir",
            SourceSelectors::new(
                "div.listing_article.clearfix article",
                "div.detail_header div.crit span",
                "Réf.",
            )
            .with_link("a.item-link"),
        ),
    ]
}

/// Square Habitat: single phase, the card description stands in for a reference.
pub struct SquareHabitat {
    card: Selector,
    description: Selector,
}

impl SquareHabitat {
    pub fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector(
                "div.biens-container.afc-display-xs-flex.afc-width-xs-100 div.card-container",
            )?,
            description: parse_selector(
                "app-card-bien > msl-card > div:nth-of-type(2) > div:nth-of-type(4) > \
                 app-texte-on-off > div.container > div.text-container > p",
            )?,
        })
    }
}

impl Adapter for SquareHabitat {
    fn title(&self) -> Option<&str> {
        Some("Square Habitat")
    }

    fn extract_candidates(&self, page: &Page, out: &mut Vec<Candidate>) {
        for (index, card) in page.select(&self.card).enumerate() {
            let description = card
                .select(&self.description)
                .map(element_text)
                .find(|text| !text.is_empty());

            match description {
                Some(text) => out.push(Candidate::Listing(Announcement::new(text, ""))),
                None => log::debug!("No description for Square Habitat card {}", index + 1),
            }
        }
    }
}

/// CA Immobilier: single phase, the reference is the last segment of the detail URL.
pub struct CaImmobilier {
    links: LinkExtractor,
}

impl CaImmobilier {
    pub fn new() -> Result<Self> {
        // The trailing "more links" block shares the card grid; `:not` keeps it out.
        Ok(Self {
            links: LinkExtractor::rows(
                "div.results-container.mosaic div.columns.large-3:not(.sub_card-entities--blocliens) \
                 article.sub_card-entities",
                "div.bottom-container div.bottom-bar a",
            )?,
        })
    }
}

impl Adapter for CaImmobilier {
    fn title(&self) -> Option<&str> {
        Some("CA Immobilier")
    }

    fn extract_candidates(&self, page: &Page, out: &mut Vec<Candidate>) {
        for url in self.links.collect(page) {
            match last_path_segment(&url) {
                Some(reference) => {
                    let reference = reference.to_string();
                    out.push(Candidate::Listing(Announcement::new(reference, url)));
                }
                None => log::debug!("Malformed CA Immobilier link skipped: {}", url),
            }
        }
    }
}

/// La Forêt: detail pages carry both a web and an agency reference, combined
/// into one composite reference.
pub struct LaForet {
    links: LinkExtractor,
    web: LabelledReference,
    agency: LabelledReference,
}

impl LaForet {
    const REFERENCE_SELECTOR: &'static str =
        "section.property__block.property-content h5.text-base.text-ref";

    pub fn new() -> Result<Self> {
        Ok(Self {
            links: LinkExtractor::rows(
                "div.properties__list div.row div.col-md-6.col-lg-6.col-xl-4",
                "a.apartment-card__link",
            )?,
            web: LabelledReference::new(Self::REFERENCE_SELECTOR, "Référence web :")?,
            agency: LabelledReference::new(Self::REFERENCE_SELECTOR, "Référence Agence :")?,
        })
    }
}

impl Adapter for LaForet {
    fn title(&self) -> Option<&str> {
        Some("La Forêt Immobilier")
    }

    fn extract_candidates(&self, page: &Page, out: &mut Vec<Candidate>) {
        out.extend(self.links.collect(page).into_iter().map(Candidate::Detail));
    }

    fn extract_reference(&self, page: &Page) -> Option<Announcement> {
        let web = self.web.extract(page).unwrap_or_default();
        let agency = self.agency.extract(page).unwrap_or_default();

        if web.is_empty() && agency.is_empty() {
            log::debug!("No La Forêt reference on {}", page.url());
            return None;
        }

        Some(Announcement::new(
            format!("Web: {web}, Agence: {agency}"),
            page.url().as_str(),
        ))
    }
}
