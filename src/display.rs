use std::io::Write;
use std::sync::{Arc as SharedArc, Mutex};

use base64::Engine;

use crate::petri_net::{Arc, PetriNet, Place, Transition};
use crate::vasm::{Op, StateMachine};
use crate::vector::Vector;
use crate::zblob::Zblob;
use crate::Model;

const FILL_ENABLED: &str = "#62fa75";
const FILL_INHIBITED: &str = "#fab5b0";
const FILL_NEUTRAL: &str = "#ffffff";

// ImageBuilder draws the net into an SVG buffer
pub trait ImageBuilder {
    fn new_svg_image(&self);
    fn write_defs(&self, buffer: &mut Vec<u8>);
    fn rect(&self, x: i64, y: i64, width: i64, height: i64, extra: &str);
    fn circle(&self, x: i64, y: i64, radius: i64, extra: &str);
    fn text(&self, x: i64, y: i64, text: &str, extra: &str);
    fn line(&self, x1: i64, y1: i64, x2: i64, y2: i64, extra: &str);
    fn group(&self);
    fn gend(&self);
    fn write_element(&self, element: String);
    fn render(&self, initial: Option<Vector>);
    fn place(&self, machine: &StateMachine, place: &Place);
    fn arc(&self, net: &PetriNet, arc: &Arc);
    fn transition(&self, machine: &StateMachine, transition: &Transition);
    fn end(&self);
}

// ImageOutput converts the rendered buffer into sharable surfaces
pub trait ImageOutput {
    fn encode_url_component(component: &str) -> String;
    fn to_base64_url(&self) -> String;
    fn to_data_url(&self) -> String;
    fn to_img_tag(&self) -> String;
    fn to_zblob(&self) -> Zblob;
    fn to_html(&self) -> String;
}

pub struct Display {
    buffer: SharedArc<Mutex<Vec<u8>>>,
    model: Model,
}

impl Display {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            buffer: SharedArc::new(Mutex::new(Vec::new())),
        }
    }

    /// Absolute token flow drawn next to an arc; the indexed form is
    /// canonical, so weights come from deltas and guards rather than the
    /// authored weight.
    fn arc_weight(net: &PetriNet, arc: &Arc) -> i64 {
        let (place_label, txn_label) = if net.places.contains_key(&arc.source) {
            (&arc.source, &arc.target)
        } else {
            (&arc.target, &arc.source)
        };
        let place = &net.places[place_label];
        let txn = &net.transitions[txn_label];
        let weight = if arc.inhibitor {
            txn.guards[place_label].delta[place.offset as usize]
        } else {
            txn.delta[place.offset as usize]
        };
        weight.abs()
    }
}

impl ImageBuilder for Display {
    fn new_svg_image(&self) {
        let (x, y, width, height) = self.model.net.get_view_port();
        let mut buffer = self.buffer.lock().unwrap();
        write!(
            buffer,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"{x} {y} {width} {height}\">"
        )
        .unwrap();
        self.write_defs(&mut buffer);
    }

    fn write_defs(&self, buffer: &mut Vec<u8>) {
        write!(
            buffer,
            "<defs><marker id=\"markerArrow1\" markerWidth=\"23\" markerHeight=\"13\" refX=\"31\" refY=\"6\" orient=\"auto\"><rect width=\"28\" height=\"3\" fill=\"white\" stroke=\"white\" x=\"3\" y=\"5\"/><path d=\"M2,2 L2,11 L10,6 L2,2\"/></marker><marker id=\"markerInhibit1\" markerWidth=\"23\" markerHeight=\"13\" refX=\"31\" refY=\"6\" orient=\"auto\"><rect width=\"28\" height=\"3\" fill=\"white\" stroke=\"white\" x=\"3\" y=\"5\"/><circle cx=\"5\" cy=\"6.5\" r=\"4\"/></marker></defs>"
        ).unwrap();
    }

    fn rect(&self, x: i64, y: i64, width: i64, height: i64, extra: &str) {
        self.write_element(format!(
            "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" {extra} />"
        ));
    }

    fn circle(&self, x: i64, y: i64, radius: i64, extra: &str) {
        self.write_element(format!(
            "<circle cx=\"{x}\" cy=\"{y}\" r=\"{radius}\" {extra} />"
        ));
    }

    fn text(&self, x: i64, y: i64, text: &str, extra: &str) {
        self.write_element(format!("<text x=\"{x}\" y=\"{y}\" {extra}>{text}</text>"));
    }

    fn line(&self, x1: i64, y1: i64, x2: i64, y2: i64, extra: &str) {
        self.write_element(format!(
            "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" {extra} />"
        ));
    }

    fn group(&self) {
        self.write_element("<g>".to_string());
    }

    fn gend(&self) {
        self.write_element("</g>".to_string());
    }

    fn write_element(&self, element: String) {
        let mut buffer = self.buffer.lock().unwrap();
        write!(buffer, "{element}").unwrap();
    }

    fn render(&self, initial: Option<Vector>) {
        let net = &self.model.net;
        let machine = match initial {
            Some(state) => net.execute_with(state),
            None => net.execute(),
        };
        for arc in &net.arcs {
            self.arc(net, arc);
        }
        for place in net.places.values() {
            self.place(&machine, place);
        }
        for transition in net.transitions.values() {
            self.transition(&machine, transition);
        }
        self.end();
    }

    fn place(&self, machine: &StateMachine, place: &Place) {
        self.group();
        let x = place.position.x;
        let y = place.position.y;
        self.circle(x, y, 16, "stroke-width=\"1.5\" fill=\"#ffffff\" stroke=\"#000000\" orient=\"0\" shapeRendering=\"auto\"");
        self.text(x - 18, y - 20, &place.label, "font-size=\"small\"");

        let tokens = machine.token_count(&place.label);
        if tokens == 1 {
            self.circle(x, y, 2, "fill=\"#000000\" stroke=\"#000000\" orient=\"0\" class=\"tokens\"");
        } else if tokens > 1 && tokens < 10 {
            self.text(x - 4, y + 5, &tokens.to_string(), "font-size=\"large\"");
        } else if tokens >= 10 {
            self.text(x - 7, y + 5, &tokens.to_string(), "font-size=\"small\"");
        }
        self.gend();
    }

    fn arc(&self, net: &PetriNet, arc: &Arc) {
        self.group();
        let marker = if arc.inhibitor {
            "url(#markerInhibit1)"
        } else {
            "url(#markerArrow1)"
        };
        let extra = format!("stroke=\"#000000\" fill=\"#000000\" marker-end=\"{marker}\"");

        let source = net
            .places
            .get(&arc.source)
            .map(|p| p.position)
            .or_else(|| net.transitions.get(&arc.source).map(|t| t.position))
            .expect("unknown arc source");
        let target = net
            .places
            .get(&arc.target)
            .map(|p| p.position)
            .or_else(|| net.transitions.get(&arc.target).map(|t| t.position))
            .expect("unknown arc target");

        self.line(source.x, source.y, target.x, target.y, &extra);

        let mid_x = (source.x + target.x) / 2;
        let mid_y = (source.y + target.y) / 2 - 8;
        let weight = Self::arc_weight(net, arc);
        self.text(mid_x - 4, mid_y + 4, &weight.to_string(), "font-size=\"small\"");
        self.gend();
    }

    fn transition(&self, machine: &StateMachine, transition: &Transition) {
        self.group();
        let op = Op {
            action: transition.label.clone(),
            multiple: 1,
            role: transition.role.label.clone(),
        };
        let valid = machine.test_fire(&op).ok;
        let (inhibited, _) = machine.inhibited(&op);
        let fill = if valid {
            FILL_ENABLED
        } else if inhibited {
            FILL_INHIBITED
        } else {
            FILL_NEUTRAL
        };

        let x = transition.position.x - 17;
        let y = transition.position.y - 17;
        self.rect(
            x,
            y,
            30,
            30,
            &format!("stroke=\"#000000\" fill=\"{fill}\" rx=\"4\""),
        );
        self.text(x, y - 8, &transition.label, "font-size=\"small\"");
        self.gend();
    }

    fn end(&self) {
        let mut buffer = self.buffer.lock().unwrap();
        write!(buffer, "</svg>").unwrap();
    }
}

impl ImageOutput for Display {
    fn encode_url_component(component: &str) -> String {
        component
            .chars()
            .map(|c| match c {
                ' ' => "%20".to_string(),
                '!' => "%21".to_string(),
                '"' => "%22".to_string(),
                '#' => "%23".to_string(),
                '$' => "%24".to_string(),
                '%' => "%25".to_string(),
                '&' => "%26".to_string(),
                '\'' => "%27".to_string(),
                '(' => "%28".to_string(),
                ')' => "%29".to_string(),
                '*' => "%2A".to_string(),
                '+' => "%2B".to_string(),
                ',' => "%2C".to_string(),
                '/' => "%2F".to_string(),
                ':' => "%3A".to_string(),
                ';' => "%3B".to_string(),
                '<' => "%3C".to_string(),
                '=' => "%3D".to_string(),
                '>' => "%3E".to_string(),
                '?' => "%3F".to_string(),
                '@' => "%40".to_string(),
                '[' => "%5B".to_string(),
                '\\' => "%5C".to_string(),
                ']' => "%5D".to_string(),
                '^' => "%5E".to_string(),
                '`' => "%60".to_string(),
                '{' => "%7B".to_string(),
                '|' => "%7C".to_string(),
                '}' => "%7D".to_string(),
                '~' => "%7E".to_string(),
                _ => c.to_string(),
            })
            .collect()
    }

    fn to_base64_url(&self) -> String {
        let buffer = self.buffer.lock().unwrap().clone();
        let base64_svg = base64::engine::general_purpose::STANDARD.encode(&buffer);
        format!("data:image/svg+xml;base64,{base64_svg}")
    }

    fn to_data_url(&self) -> String {
        let buffer = self.buffer.lock().unwrap();
        let encoded = Self::encode_url_component(&String::from_utf8_lossy(&buffer));
        format!("data:image/svg+xml,{encoded}")
    }

    fn to_img_tag(&self) -> String {
        format!("<img src=\"{}\" />", self.to_data_url())
    }

    fn to_zblob(&self) -> Zblob {
        self.model.net.to_zblob()
    }

    fn to_html(&self) -> String {
        let zblob = self.to_zblob();
        let cid = zblob.ipfs_cid;
        let zipped_data = zblob.base64_zipped;
        let image = self.to_img_tag();
        let pretty_json = serde_json::to_string_pretty(&self.model.net.to_json().unwrap()).unwrap();
        let model_type = self.model.net.model_type.clone();

        format!(
            r#"<!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width,initial-scale=1"/>
                <title>metamodel viewer</title>
                <script>
                    sessionStorage.cid = "{cid}";
                    sessionStorage.data = "{zipped_data}";
                </script>
            </head>
            <body>
                <h5>{model_type}:{cid}</h5>
                <a href="https://pflow.dev/?z={zipped_data}">{image}</a>
                <br/>
                <textarea id="svg" style="position: absolute; bottom: 0; height: 60%; width: 98%; padding: 0 5px;">
                    {pretty_json}
                </textarea>
            </body>
        </html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Dsl;

    fn svg(model: Model, state: Option<Vector>) -> String {
        let display = Display::new(model);
        display.new_svg_image();
        display.render(state);
        let bytes = display.buffer.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn highlight_model(p: &mut dyn Dsl) {
        p.model_type("petriNet");
        let place0 = p.cell("place0", Some(1), Some(3), 100, 180);
        let txn0 = p.func("txn0", "default", 20, 100);
        let txn1 = p.func("txn1", "default", 180, 100);
        let txn2 = p.func("txn2", "default", 20, 260);
        let txn3 = p.func("txn3", "default", 180, 260);
        p.arrow(&txn0, &place0, 1);
        p.arrow(&place0, &txn1, 3);
        p.guard(&txn2, &place0, 3);
        p.guard(&place0, &txn3, 1);
    }

    #[test]
    fn test_render_uses_view_port() {
        let out = svg(Model::new(highlight_model), None);
        let (x, y, w, h) = (-40, 40, 280, 280);
        assert!(out.starts_with(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"{x} {y} {w} {h}\">"
        )));
        assert!(out.ends_with("</svg>"));
    }

    #[test]
    fn test_render_highlights_status() {
        let out = svg(Model::new(highlight_model), None);
        // txn0 can fire into place0; txn2's read arc needs 3 tokens
        assert!(out.contains(FILL_ENABLED));
        assert!(out.contains(FILL_INHIBITED));
        // place0 holds a single token, drawn as a dot
        assert!(out.contains("class=\"tokens\""));
    }

    #[test]
    fn test_render_with_explicit_state() {
        let out = svg(Model::new(highlight_model), Some(vec![5]));
        assert!(out.contains(">5</text>"));
    }

    #[test]
    fn test_arc_weight_labels() {
        let out = svg(Model::new(highlight_model), None);
        // place0 -> txn1 consumes 3 tokens
        assert!(out.contains(">3</text>"));
        assert!(out.contains("url(#markerInhibit1)"));
        assert!(out.contains("url(#markerArrow1)"));
    }

    #[test]
    fn test_display_html() {
        let display = Display::new(Model::new(highlight_model));
        display.new_svg_image();
        display.render(None);
        let html = display.to_html();
        assert!(html.contains("petriNet:"));
        assert!(html.contains("data:image/svg+xml,"));

        if std::env::var("WRITE_TO_FILE").is_ok() {
            let mut file = std::fs::File::create("/tmp/test.html").unwrap();
            file.write_all(html.as_bytes()).unwrap();
        }
    }
}
