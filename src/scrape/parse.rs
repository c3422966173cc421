//! Listing and detail page parsing
//!
//! Pages are parsed into a DOM with `scraper`. Rows and role cards are
//! located with CSS selectors; sections that follow a heading are found by
//! walking the heading's siblings.

use crate::markup::{element_lines, element_text};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(?\d{3}\)?\s?\d{3}-\d{4}").expect("phone pattern"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern")
    })
}

fn labelled_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^(Registration #|Registration Type|Expires):[ \t]*(.*)$")
            .expect("labelled field pattern")
    })
}

/// Descendants of `scope` matching `css`, in document order
fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(e) => {
            tracing::warn!("Unusable selector {:?}: {:?}", css, e);
            Vec::new()
        }
    }
}

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    select_all(scope, css).into_iter().next()
}

fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Following sibling elements of `el` that satisfy `keep`
fn next_siblings_where<'a>(
    el: ElementRef<'a>,
    keep: impl Fn(&ElementRef<'a>) -> bool,
) -> impl Iterator<Item = ElementRef<'a>> {
    el.next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(move |s| keep(s))
}

fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

/// A `tr.link-view` row as rendered, identifier unchecked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub pid: Option<String>,
    pub name: String,
}

/// Every clickable row of a listing, in document order
///
/// The name is the first line of the row's first cell.
pub fn listing_entries(html: &str) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);
    select_all(document.root_element(), "tr.link-view")
        .into_iter()
        .map(|tr| {
            let name = select_first(tr, "td")
                .map(|td| {
                    let text: String = td.text().collect();
                    text.split('\n').next().unwrap_or_default().trim().to_string()
                })
                .unwrap_or_else(|| "Unknown".to_string());
            ListingEntry {
                pid: tr.value().attr("data-pid").map(str::to_string),
                name,
            }
        })
        .collect()
}

/// A row of the search/listing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub pid: u64,
    pub name: String,
}

/// Rows carrying a numeric `data-pid`. Rows without one are skipped.
pub fn parse_listing(html: &str) -> Vec<ListingRow> {
    listing_entries(html)
        .into_iter()
        .filter_map(|entry| {
            let raw = entry.pid?;
            let Ok(pid) = raw.trim().parse::<u64>() else {
                tracing::debug!("Skipping listing row with pid {:?}", raw);
                return None;
            };
            Some(ListingRow {
                pid,
                name: entry.name,
            })
        })
        .collect()
}

/// A person or company block from a role card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// Split a contact block into its parts. The first line is the name; lines
/// that look like a phone number or an email never count as address.
fn extract_contact(block: ElementRef<'_>) -> Contact {
    let lines = element_lines(block);
    let Some(name) = lines.first().cloned() else {
        return Contact::default();
    };
    let text = lines.join("\n");

    let phone = phone_re()
        .find(&text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let email = email_re()
        .find(&text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let address = lines[1..]
        .iter()
        .filter(|l| !phone_re().is_match(l) && !l.contains('@') && **l != name)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    Contact {
        name,
        phone,
        email,
        address,
    }
}

/// Contact roles shown on a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    President,
    Manager,
    PayoffContact,
    BoardMember,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::President,
        Role::Manager,
        Role::PayoffContact,
        Role::BoardMember,
    ];

    /// Column prefix used in the export
    pub fn label(&self) -> &'static str {
        match self {
            Role::President => "President",
            Role::Manager => "Manager",
            Role::PayoffContact => "Payoff Contact",
            Role::BoardMember => "Board Member",
        }
    }

    /// Role named by a card heading, if it is one we track
    fn from_heading(heading: &str) -> Option<Role> {
        if heading.contains("President") {
            Some(Role::President)
        } else if heading.contains("Community Manager") {
            Some(Role::Manager)
        } else if heading.contains("Payoff Contact") {
            Some(Role::PayoffContact)
        } else {
            None
        }
    }
}

/// Everything the detail page says about one HOA
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoaRecord {
    pub entity_id: u64,
    pub name: String,
    pub dba: String,
    pub registration: String,
    pub registration_type: String,
    pub status: String,
    pub expires: String,
    pub location: String,
    pub mailing_address: String,
    pub presidents: Vec<Contact>,
    pub managers: Vec<Contact>,
    pub payoff_contacts: Vec<Contact>,
    pub board_members: Vec<Contact>,
}

impl HoaRecord {
    pub fn contacts(&self, role: Role) -> &[Contact] {
        match role {
            Role::President => &self.presidents,
            Role::Manager => &self.managers,
            Role::PayoffContact => &self.payoff_contacts,
            Role::BoardMember => &self.board_members,
        }
    }

    fn contacts_mut(&mut self, role: Role) -> &mut Vec<Contact> {
        match role {
            Role::President => &mut self.presidents,
            Role::Manager => &mut self.managers,
            Role::PayoffContact => &mut self.payoff_contacts,
            Role::BoardMember => &mut self.board_members,
        }
    }
}

/// The first `<p>` sibling after the `<h5>` whose text is `heading`
fn paragraph_after_heading<'a>(root: ElementRef<'a>, heading: &str) -> Option<ElementRef<'a>> {
    let h5 = select_all(root, "h5")
        .into_iter()
        .find(|h| element_text(*h) == heading)?;
    next_siblings_where(h5, |s| s.value().name() == "p").next()
}

/// Parse a detail page. Missing sections leave their fields empty.
pub fn parse_detail(html: &str, entity_id: u64) -> HoaRecord {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut record = HoaRecord {
        entity_id,
        ..Default::default()
    };

    record.name = select_first(root, "h1.mb-0")
        .or_else(|| select_first(root, "h1"))
        .map(element_text)
        .unwrap_or_default();

    if let Some(h3) = select_first(root, "h3.my-0") {
        let text = element_text(h3);
        if text.contains("DBA") {
            record.dba = text.replace("DBA:", "").trim().to_string();
        }
    }

    if let Some(h6) = select_first(root, "h6") {
        let block = element_lines(h6).join("\n");
        for cap in labelled_re().captures_iter(&block) {
            let value = cap[2].trim().to_string();
            match &cap[1] {
                "Registration #" => record.registration = value,
                "Registration Type" => record.registration_type = value,
                _ => record.expires = value,
            }
        }
        record.status = select_first(h6, "span")
            .map(element_text)
            .unwrap_or_default();
    }

    record.location = paragraph_after_heading(root, "Location:")
        .map(element_text)
        .unwrap_or_default();
    record.mailing_address = paragraph_after_heading(root, "Contact Info:")
        .map(|p| element_lines(p).join(", "))
        .unwrap_or_default();

    if let Some(container) = select_first(root, "div.row.border.primary-color-border.mt-4") {
        for heading in select_all(container, "h4.mb-0") {
            let Some(role) = Role::from_heading(&element_text(heading)) else {
                continue;
            };
            let contact = parent_element(heading)
                .and_then(|card| select_first(card, "p.mt-0.ml-3"))
                .map(extract_contact);
            if let Some(contact) = contact {
                record.contacts_mut(role).push(contact);
            }
        }
    }

    if let Some(header) = select_first(root, "h4.border-bottom") {
        let title = element_text(header);
        if title.contains("Board Members") || title.contains("Management Committee") {
            let members = parent_element(header)
                .into_iter()
                .flat_map(|section| {
                    next_siblings_where(section, |s| {
                        s.value().name() == "div"
                            && (has_class(s, "col-md-6") || has_class(s, "col-lg-3"))
                    })
                })
                .filter_map(|card| select_first(card, "p.ml-3"))
                .map(extract_contact);
            record.board_members.extend(members);
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<table class="table">
<thead><tr><th>Name</th><th>Registration #</th></tr></thead>
<tbody>
<tr class="link-view" data-pid="1001"><td>Aspen Ridge Owners Association
<small>DBA Aspen Ridge</small></td><td>HOA-1001</td></tr>
<tr class="link-view" data-pid="abc"><td>Broken Row</td></tr>
<tr class="link-view"><td>No Pid</td></tr>
<tr class="link-view" data-pid="1002"><td>Canyon View Condominiums</td><td>HOA-1002</td></tr>
</tbody></table>"#;

    const DETAIL: &str = r#"<div class="container"><div class="row"><div class="col-12">
<h1 class="mb-0">Aspen Ridge Owners Association</h1>
<h3 class="my-0">DBA: Aspen Ridge</h3>
<h6>Registration #: HOA-1001<br>
Registration Type: Homeowners Association<br>
Status: <span class="badge badge-info">Active</span><br>
Expires: 03/31/2027</h6>
<h5>Location:</h5>
<p>Salt Lake County</p>
<h5>Contact Info:</h5>
<p>PO Box 100<br>
Salt Lake City, UT 84101</p>
</div></div>
<div class="row border primary-color-border mt-4">
<div class="col-md-4"><h4 class="mb-0">President</h4>
<p class="mt-0 ml-3">Jane Smith<br>
(801) 555-0101<br>
jane@aspenridge.org<br>
12 Aspen Way<br>
Salt Lake City, UT 84101</p></div>
<div class="col-md-4"><h4 class="mb-0">Community Manager</h4>
<p class="mt-0 ml-3">Wasatch Community Management<br>
office@wasatchcm.com</p></div>
<div class="col-md-4"><h4 class="mb-0">Registered Agent</h4>
<p class="mt-0 ml-3">Someone Else</p></div>
</div>
<div class="row">
<div class="col-12"><h4 class="border-bottom">Board Members</h4></div>
<div class="col-md-6 col-lg-3"><p class="ml-3">Tom Jones<br>
(801) 555-0110</p></div>
<div class="col-md-6 col-lg-3"><p class="ml-3">Maria Lopez<br>
801 555-0111<br>
18 Aspen Way</p></div>
</div>
</div>"#;

    #[test]
    fn listing_keeps_rows_with_numeric_pids() {
        let rows = parse_listing(LISTING);
        assert_eq!(
            rows,
            vec![
                ListingRow {
                    pid: 1001,
                    name: "Aspen Ridge Owners Association".into()
                },
                ListingRow {
                    pid: 1002,
                    name: "Canyon View Condominiums".into()
                },
            ]
        );
    }

    #[test]
    fn listing_entries_keep_unchecked_ids() {
        let entries = listing_entries(LISTING);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1].pid.as_deref(), Some("abc"));
        assert_eq!(entries[2].pid, None);
        assert_eq!(entries[2].name, "No Pid");
    }

    #[test]
    fn listing_without_rows_is_empty() {
        let html = r#"<div class="alert alert-warning">No results found.</div>"#;
        assert!(parse_listing(html).is_empty());
    }

    fn contact_of(block: &str) -> Contact {
        let fragment = Html::parse_fragment(block);
        let p = select_first(fragment.root_element(), "p").unwrap();
        extract_contact(p)
    }

    #[test]
    fn contact_splits_name_phone_email_address() {
        let contact = contact_of(
            "<p>Jane Smith<br>\n(801) 555-0101<br>\njane@aspenridge.org<br>\n12 Aspen Way<br>\nSalt Lake City, UT 84101</p>",
        );
        assert_eq!(contact.name, "Jane Smith");
        assert_eq!(contact.phone, "(801) 555-0101");
        assert_eq!(contact.email, "jane@aspenridge.org");
        assert_eq!(contact.address, "12 Aspen Way, Salt Lake City, UT 84101");
    }

    #[test]
    fn empty_contact_block() {
        assert_eq!(contact_of("<p>  <br> </p>"), Contact::default());
    }

    #[test]
    fn contact_decodes_numeric_entities() {
        let contact = contact_of("<p class=\"ml-3\">Jos&#233; O&#x27;Brien<br>(801) 555-0199</p>");
        assert_eq!(contact.name, "Jos\u{e9} O'Brien");
        assert_eq!(contact.phone, "(801) 555-0199");
    }

    #[test]
    fn listing_accepts_unquoted_attributes() {
        let html = "<table><tbody><tr class=link-view data-pid=42><td>Oak Hollow</td></tr></tbody></table>";
        assert_eq!(
            parse_listing(html),
            vec![ListingRow {
                pid: 42,
                name: "Oak Hollow".into()
            }]
        );
    }

    #[test]
    fn listing_ignores_commented_rows() {
        let html = r#"<table><tbody>
<!-- <tr class="link-view" data-pid="9"><td>Old Row</td></tr> -->
<tr class="link-view" data-pid="10"><td>Live Row</td></tr>
</tbody></table>"#;
        let pids: Vec<u64> = parse_listing(html).iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![10]);
    }

    #[test]
    fn detail_fixed_fields() {
        let record = parse_detail(DETAIL, 1001);
        assert_eq!(record.entity_id, 1001);
        assert_eq!(record.name, "Aspen Ridge Owners Association");
        assert_eq!(record.dba, "Aspen Ridge");
        assert_eq!(record.registration, "HOA-1001");
        assert_eq!(record.registration_type, "Homeowners Association");
        assert_eq!(record.status, "Active");
        assert_eq!(record.expires, "03/31/2027");
        assert_eq!(record.location, "Salt Lake County");
        assert_eq!(record.mailing_address, "PO Box 100, Salt Lake City, UT 84101");
    }

    #[test]
    fn detail_role_cards_and_board() {
        let record = parse_detail(DETAIL, 1001);

        assert_eq!(record.presidents.len(), 1);
        assert_eq!(record.presidents[0].name, "Jane Smith");
        assert_eq!(record.managers.len(), 1);
        assert_eq!(record.managers[0].email, "office@wasatchcm.com");
        assert!(record.payoff_contacts.is_empty());

        let board: Vec<&str> = record.board_members.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(board, vec!["Tom Jones", "Maria Lopez"]);
        assert_eq!(record.board_members[1].phone, "801 555-0111");
        assert_eq!(record.board_members[1].address, "18 Aspen Way");
    }

    #[test]
    fn board_stops_at_its_own_section() {
        let html = format!(
            "{}<div class=\"row footer\"><div class=\"col-md-6\"><p class=\"ml-3\">Footer Contact Us</p></div></div>\n</div>",
            DETAIL.strip_suffix("</div>").unwrap()
        );
        let record = parse_detail(&html, 1001);
        let board: Vec<&str> = record.board_members.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(board, vec!["Tom Jones", "Maria Lopez"]);
    }

    #[test]
    fn board_member_names_decode_entities() {
        let html = DETAIL.replace("Tom Jones", "Jos&#233; O&#x27;Brien");
        let record = parse_detail(&html, 1001);
        assert_eq!(record.board_members[0].name, "Jos\u{e9} O'Brien");
    }

    #[test]
    fn location_is_the_paragraph_after_its_heading() {
        let html = DETAIL.replace("<h5>Location:</h5>\n<p>", "<h5>Location:</h5>\n<small>see map</small>\n<p>");
        assert_eq!(parse_detail(&html, 1001).location, "Salt Lake County");
    }

    #[test]
    fn detail_without_sections_is_mostly_blank() {
        let record = parse_detail("<h1>Just A Name</h1>", 7);
        assert_eq!(record.name, "Just A Name");
        assert_eq!(record.dba, "");
        assert_eq!(record.registration, "");
        assert!(record.board_members.is_empty());
    }
}
