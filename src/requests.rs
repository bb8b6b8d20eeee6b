//! Bid requests offered to bidders, shaped after OpenRTB with a single impression.

use crate::config::RequestTemplate;
use crate::strategy::{Signals, SIGNAL_HIGH_VALUE_SEGMENT, SIGNAL_RETURNING_USER};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub w: u32,
    pub h: u32,
    pub pos: u32,
}

/// The impression slot on offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impression {
    pub id: String,
    pub banner: Banner,
    pub bidfloor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub ua: String,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Contextual signals about the user (returning_user, high_value_segment, ...)
    #[serde(default, skip_serializing_if = "Signals::is_empty")]
    pub ext: Signals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRequest {
    pub id: String,
    /// Always exactly one element, see `impression()`
    pub imp: Vec<Impression>,
    pub site: Site,
    pub device: Device,
    pub user: User,
}

impl BidRequest {
    /// Build a request with the single impression described by `template`
    pub fn new(id: String, template: &RequestTemplate) -> Self {
        Self {
            id,
            imp: vec![Impression {
                id: "1".to_string(),
                banner: Banner {
                    w: template.width,
                    h: template.height,
                    pos: template.position,
                },
                bidfloor: template.floor_price,
            }],
            site: Site {
                id: template.site_id.clone(),
                domain: template.site_domain.clone(),
            },
            device: Device {
                ua: template.device_ua.clone(),
                ip: template.device_ip.clone(),
            },
            user: User {
                id: template.user_id.clone(),
                ext: Signals::new(),
            },
        }
    }

    /// The impression on offer
    pub fn impression(&self) -> &Impression {
        &self.imp[0]
    }

    pub fn floor_price(&self) -> f64 {
        self.impression().bidfloor
    }
}

/// Identifier in the `<prefix>-NNNN` form used for requests and bids
/// Uniqueness is not guaranteed; ids are only for display
pub fn random_id(prefix: &str, rng: &mut StdRng) -> String {
    format!("{}-{}", prefix, rng.gen_range(1000..=9999))
}

/// Produces synthetic bid requests from a template
pub struct RequestGenerator {
    template: RequestTemplate,
}

impl RequestGenerator {
    pub fn new(template: RequestTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    pub fn generate_request(&self, rng: &mut StdRng) -> BidRequest {
        let mut request = BidRequest::new(random_id("bid", rng), &self.template);

        // Only draw for signals that can occur, so the default template consumes
        // exactly one random number per request
        if self.template.returning_user_rate > 0.0 {
            let flag = rng.gen_bool(self.template.returning_user_rate);
            request.user.ext.insert(SIGNAL_RETURNING_USER.to_string(), flag.into());
        }
        if self.template.high_value_segment_rate > 0.0 {
            let flag = rng.gen_bool(self.template.high_value_segment_rate);
            request.user.ext.insert(SIGNAL_HIGH_VALUE_SEGMENT.to_string(), flag.into());
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_reference_request_shape() {
        let generator = RequestGenerator::new(RequestTemplate::default());
        let mut rng = StdRng::seed_from_u64(1);
        let request = generator.generate_request(&mut rng);

        assert!(request.id.starts_with("bid-"));
        let number: u32 = request.id["bid-".len()..].parse().unwrap();
        assert!((1000..=9999).contains(&number));
        assert_eq!(request.imp.len(), 1);
        assert_eq!(request.impression().id, "1");
        assert_eq!(request.impression().banner, Banner { w: 300, h: 250, pos: 1 });
        assert_eq!(request.floor_price(), 0.01);
        assert_eq!(request.site.domain, "example.com");
        assert!(request.user.ext.is_empty());
    }

    #[test]
    fn test_template_is_configurable() {
        let template = RequestTemplate {
            width: 728,
            height: 90,
            floor_price: 0.75,
            ..RequestTemplate::default()
        };
        let generator = RequestGenerator::new(template);
        let request = generator.generate_request(&mut StdRng::seed_from_u64(2));
        assert_eq!(request.impression().banner.w, 728);
        assert_eq!(request.impression().banner.h, 90);
        assert_eq!(request.floor_price(), 0.75);
    }

    #[test]
    fn test_signal_rates() {
        let template = RequestTemplate {
            returning_user_rate: 1.0,
            high_value_segment_rate: 1.0,
            ..RequestTemplate::default()
        };
        let generator = RequestGenerator::new(template);
        let request = generator.generate_request(&mut StdRng::seed_from_u64(3));
        assert_eq!(request.user.ext.get(SIGNAL_RETURNING_USER), Some(&serde_json::Value::Bool(true)));
        assert_eq!(request.user.ext.get(SIGNAL_HIGH_VALUE_SEGMENT), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_same_seed_same_request() {
        let generator = RequestGenerator::new(RequestTemplate::default());
        let a = generator.generate_request(&mut StdRng::seed_from_u64(9));
        let b = generator.generate_request(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_serializes_openrtb_field_names() {
        let request = BidRequest::new("bid-1234".to_string(), &RequestTemplate::default());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["imp"][0]["bidfloor"], serde_json::json!(0.01));
        assert_eq!(json["imp"][0]["banner"]["w"], serde_json::json!(300));
        assert!(json["user"].get("ext").is_none());
    }
}
