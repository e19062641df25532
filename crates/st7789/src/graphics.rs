use embedded_graphics_core::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Size},
    pixelcolor::{IntoStorage, Rgb565},
    primitives::{PointsIter, Rectangle},
};
use embedded_hal::{digital::OutputPin, spi::SpiDevice};

use crate::{Error, St7789};

impl<SPI, DC, RST> DrawTarget for St7789<SPI, DC, RST>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin,
{
    type Color = Rgb565;
    type Error = Error<SPI::Error, DC::Error, RST::Error>;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.size();
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= width as i32 || point.y >= height as i32 {
                continue;
            }

            let x = point.x as u16;
            let y = point.y as u16;
            self.write_pixels(x, y, 1, 1, [color.into_storage()])?;
        }

        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let visible = area.intersection(&self.bounding_box());
        if visible != *area {
            let pixels = area
                .points()
                .zip(colors)
                .map(|(point, color)| Pixel(point, color));
            return self.draw_iter(pixels);
        }
        if area.size.width == 0 || area.size.height == 0 {
            return Ok(());
        }

        self.write_pixels(
            area.top_left.x as u16,
            area.top_left.y as u16,
            area.size.width as u16,
            area.size.height as u16,
            colors.into_iter().map(IntoStorage::into_storage),
        )
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let visible = area.intersection(&self.bounding_box());
        if visible.size.width == 0 || visible.size.height == 0 {
            return Ok(());
        }

        self.fill_rect(
            visible.top_left.x as u16,
            visible.top_left.y as u16,
            visible.size.width as u16,
            visible.size.height as u16,
            color.into_storage(),
        )
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        St7789::clear(self, color.into_storage())
    }
}

impl<SPI, DC, RST> OriginDimensions for St7789<SPI, DC, RST> {
    fn size(&self) -> Size {
        let (width, height) = self.config.orientation().size();
        Size::new(width as u32, height as u32)
    }
}
