use super::{FobAction, FobConfig, FobPages, WifiMode, WifiStatusSource};
use crate::{
    canvas::{BACKGROUND_DEFAULT, Canvas, Color, FOREGROUND_DEFAULT, print_fmt},
    menu::{Page, PageId, PageItem},
    render::RenderHooks,
};

/// Wi-Fi decoration: the home indicator color and the status block shown
/// under the Wi-Fi page when its back item is highlighted.
pub struct FobRenderHooks<S> {
    status: S,
    pages: FobPages,
    config: FobConfig,
}

impl<S> FobRenderHooks<S> {
    pub const fn new(status: S, pages: FobPages, config: FobConfig) -> Self {
        Self {
            status,
            pages,
            config,
        }
    }
}

impl<S> RenderHooks<FobAction> for FobRenderHooks<S>
where
    S: WifiStatusSource,
{
    fn item_rendering(&mut self, token: &FobAction, item: &mut PageItem<FobAction>) {
        if *token != FobAction::WifiIndicator {
            return;
        }
        let status = self.status.snapshot();
        let color = match status.mode {
            WifiMode::Off => Color::GREY,
            _ if status.is_up() => Color::GREEN,
            _ => Color::RED,
        };
        item.set_aux_background(color);
    }

    fn page_rendered<C: Canvas + ?Sized>(
        &mut self,
        id: PageId,
        page: &Page<FobAction>,
        canvas: &mut C,
    ) {
        if id != self.pages.wifi || page.highlighted_index() != Some(self.pages.wifi_status_item)
        {
            return;
        }

        let status = self.status.snapshot();
        let (label, ssid) = match status.mode {
            WifiMode::Off => {
                canvas.set_text_color(Color::RED, Color::BLACK);
                canvas.print("WiFi not INIT!\n");
                canvas.set_text_color(FOREGROUND_DEFAULT, BACKGROUND_DEFAULT);
                return;
            }
            WifiMode::AccessPoint => ("(AP) ", self.config.ap_ssid),
            WifiMode::Station => ("(STA)", self.config.sta_ssid),
        };

        canvas.set_text_color(FOREGROUND_DEFAULT, BACKGROUND_DEFAULT);
        print_fmt(canvas, format_args!("\n{label}:"));

        let indicator = if status.is_up() { Color::GREEN } else { Color::RED };
        canvas.set_text_color(Color::BLACK, indicator);
        canvas.print(" \n");
        canvas.set_text_color(FOREGROUND_DEFAULT, BACKGROUND_DEFAULT);

        if status.is_up() {
            print_fmt(canvas, format_args!("SSID :{ssid}\n"));
            match status.ip {
                Some(ip) => print_fmt(canvas, format_args!("IPAdr:{ip}\n")),
                None => canvas.print("IPAdr:-\n"),
            }
        }
    }
}
