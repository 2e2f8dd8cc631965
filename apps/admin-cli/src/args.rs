//! Flag parsing for the `create` and `edit` commands.

use domain::{Feature, PartnershipDraft};

/// Field changes requested on the command line. Values stay as typed; the
/// validator decides whether they are acceptable.
#[derive(Debug, Default, PartialEq)]
pub struct EditFlags {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub portal_url: Option<String>,
    pub fee: Option<String>,
    pub enable: Vec<Feature>,
    pub disable: Vec<Feature>,
    pub instant_billing: Option<bool>,
}

impl EditFlags {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut flags = Self::default();
        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--instant-billing" => {
                    flags.instant_billing = Some(true);
                    i += 1;
                    continue;
                }
                "--no-instant-billing" => {
                    flags.instant_billing = Some(false);
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let Some(value) = args.get(i + 1).cloned() else {
                return Err(format!("{} requires a value", flag));
            };
            match flag {
                "--name" => flags.name = Some(value),
                "--currency" => flags.currency = Some(value),
                "--url" => flags.portal_url = Some(value),
                "--fee" => flags.fee = Some(value),
                "--feature" => flags.enable.push(parse_feature(&value)?),
                "--no-feature" => flags.disable.push(parse_feature(&value)?),
                unk => return Err(format!("unknown argument: {}", unk)),
            }
            i += 2;
        }
        Ok(flags)
    }

    pub fn apply(&self, draft: &mut PartnershipDraft) {
        if let Some(ref name) = self.name {
            draft.name = name.clone();
        }
        if let Some(ref currency) = self.currency {
            draft.currency = currency.clone();
        }
        if let Some(ref url) = self.portal_url {
            draft.portal_url = url.clone();
        }
        if let Some(ref fee) = self.fee {
            draft.item_fee_percent = fee.clone();
        }
        for f in &self.enable {
            draft.toggle_feature(*f, true);
        }
        for f in &self.disable {
            draft.toggle_feature(*f, false);
        }
        if let Some(on) = self.instant_billing {
            draft.instant_billing = on;
        }
    }
}

fn parse_feature(s: &str) -> Result<Feature, String> {
    Feature::parse(s).ok_or_else(|| {
        let options: Vec<&str> = Feature::ALL.iter().map(Feature::as_str).collect();
        format!("unknown feature '{}' (options: {})", s, options.join(", "))
    })
}
